//! The Guardian Content API.
//!
//! Articles come from `/search` scoped to the `sport` section, ordered
//! newest first, with the HTML body requested through `show-fields=body`.
//! `webTitle`, `webUrl` and `fields.body` map to the internal
//! title/url/text.

use super::{ArticleSource, GENERIC_FAILURE, is_success, status_error};
use crate::error::ProviderError;
use crate::models::{ArticleRecord, TimeRange};
use crate::utils::{strip_html, truncate_for_log};
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const GUARDIAN_SEARCH_URL: &str = "https://content.guardianapis.com/search";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<SearchResponse>,
    /// Gateway errors (bad key, throttling) arrive outside `response`.
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: Option<String>,
    message: Option<String>,
    results: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    web_title: Option<String>,
    web_url: Option<String>,
    fields: Option<ItemFields>,
}

#[derive(Debug, Deserialize)]
struct ItemFields {
    body: Option<String>,
}

/// Client for the Guardian `/search` endpoint.
#[derive(Debug, Clone)]
pub struct GuardianSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GuardianSource {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: GUARDIAN_SEARCH_URL.to_string(),
        }
    }

    /// Build the search URL for `window`, asking for `limit` results.
    pub fn search_url(&self, window: TimeRange, limit: usize) -> Result<Url, url::ParseError> {
        let from = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let to = window.end.to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = limit.clamp(1, 50).to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("section", "sport"),
                ("from-date", from.as_str()),
                ("to-date", to.as_str()),
                ("order-by", "newest"),
                ("show-fields", "body"),
                ("page-size", page_size.as_str()),
                ("api-key", self.api_key.as_str()),
            ],
        )
    }
}

impl ArticleSource for GuardianSource {
    fn name(&self) -> &'static str {
        "guardian"
    }

    #[instrument(level = "info", skip_all, fields(from = %window.start, to = %window.end, limit = limit))]
    async fn fetch_recent_articles(
        &self,
        window: TimeRange,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, ProviderError> {
        let url = self.search_url(window, limit)?;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, preview = %truncate_for_log(&body, 300), "Guardian response");

        let articles = parse_search_response(status, &body, limit)?;
        if articles.is_empty() {
            info!("Guardian returned no sports articles in window");
        } else {
            info!(count = articles.len(), "Fetched Guardian articles");
        }
        Ok(articles)
    }
}

/// Decode a `/search` response into at most `limit` articles.
pub(crate) fn parse_search_response(
    status: u16,
    body: &str,
    limit: usize,
) -> Result<Vec<ArticleRecord>, ProviderError> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if is_success(status) => return Err(e.into()),
        Err(_) => return Err(status_error(status, None)),
    };

    let inner_message = envelope.response.as_ref().and_then(|r| r.message.clone());
    if !is_success(status) {
        return Err(status_error(status, inner_message.or(envelope.message)));
    }

    let Some(response) = envelope.response else {
        warn!(message = ?envelope.message, "Guardian response missing `response` object");
        return Err(ProviderError::MissingResults("response.results"));
    };
    if response.status.as_deref() == Some("error") {
        return Err(ProviderError::Status {
            status,
            message: response.message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        });
    }
    let results = response
        .results
        .ok_or(ProviderError::MissingResults("response.results"))?;

    Ok(results
        .into_iter()
        .take(limit)
        .map(|item| {
            let text = item.fields.and_then(|f| f.body).map(|b| strip_html(&b));
            ArticleRecord::from_parts(item.web_title, item.web_url, text)
        })
        .collect())
}
