//! NewsAPI top headlines.
//!
//! `/v2/top-headlines` has no date parameters, so the trailing window is
//! applied client-side on `publishedAt`. Article bodies are the truncated
//! `content` field (falling back to `description`), with NewsAPI's
//! `[+N chars]` marker removed.

use super::{ArticleSource, GENERIC_FAILURE, is_success, status_error};
use crate::error::ProviderError;
use crate::models::{ArticleRecord, TimeRange};
use crate::utils::{strip_html, truncate_for_log};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

pub const NEWSAPI_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";

/// NewsAPI's maximum page size.
const MAX_PAGE_SIZE: usize = 100;

/// Placeholder title NewsAPI uses for withdrawn articles.
const REMOVED_TITLE: &str = "[Removed]";

static CHARS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(…\s*)?\[\+\d+ chars\]\s*$").expect("static regex"));

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: Option<String>,
    message: Option<String>,
    articles: Option<Vec<HeadlineItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlineItem {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published_at: Option<String>,
}

impl HeadlineItem {
    /// Publication time, or `None` when absent or unparseable.
    fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }

    fn into_record(self) -> ArticleRecord {
        let body = self
            .content
            .filter(|c| !c.trim().is_empty())
            .or(self.description)
            .map(|b| CHARS_MARKER.replace(&strip_html(&b), "").into_owned());
        ArticleRecord::from_parts(self.title, self.url, body)
    }
}

/// Client for NewsAPI's `/v2/top-headlines` endpoint.
#[derive(Debug, Clone)]
pub struct NewsApiSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiSource {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: NEWSAPI_HEADLINES_URL.to_string(),
        }
    }

    /// Build the headlines URL. Over-fetches so window filtering still
    /// leaves `limit` articles when some are stale.
    pub fn headlines_url(&self, limit: usize) -> Result<Url, url::ParseError> {
        let page_size = (limit * 4).clamp(20, MAX_PAGE_SIZE).to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("category", "sports"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ],
        )
    }
}

impl ArticleSource for NewsApiSource {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    #[instrument(level = "info", skip_all, fields(from = %window.start, to = %window.end, limit = limit))]
    async fn fetch_recent_articles(
        &self,
        window: TimeRange,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, ProviderError> {
        let url = self.headlines_url(limit)?;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, preview = %truncate_for_log(&body, 300), "NewsAPI response");

        let articles = parse_headlines_response(status, &body, window, limit)?;
        if articles.is_empty() {
            info!("NewsAPI returned no sports articles in window");
        } else {
            info!(count = articles.len(), "Fetched NewsAPI articles");
        }
        Ok(articles)
    }
}

/// Decode a headlines response into at most `limit` in-window articles.
///
/// Items with no parseable `publishedAt` are kept, since their age is unknown.
pub(crate) fn parse_headlines_response(
    status: u16,
    body: &str,
    window: TimeRange,
    limit: usize,
) -> Result<Vec<ArticleRecord>, ProviderError> {
    let response: HeadlinesResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) if is_success(status) => return Err(e.into()),
        Err(_) => return Err(status_error(status, None)),
    };

    if !is_success(status) {
        return Err(status_error(status, response.message));
    }
    if response.status.as_deref() == Some("error") {
        return Err(ProviderError::Status {
            status,
            message: response.message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        });
    }
    let items = response
        .articles
        .ok_or(ProviderError::MissingResults("articles"))?;

    Ok(items
        .into_iter()
        .filter(|item| item.title.as_deref() != Some(REMOVED_TITLE))
        .filter(|item| item.published().is_none_or(|at| window.contains(at)))
        .take(limit)
        .map(HeadlineItem::into_record)
        .collect())
}
