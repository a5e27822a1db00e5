//! Per-article summarization.
//!
//! Every valid article gets exactly one completion call and exactly one
//! [`SummaryRecord`]. A failed or empty completion yields
//! [`SENTINEL_SUMMARY`] instead, so the batch never aborts and downstream
//! rendering never sees a missing summary.
//!
//! Calls are issued one at a time with a fixed pause between them to stay
//! under the provider's rate limit.

use crate::api::{ChatMessage, CompletionClient, CompletionRequest};
use crate::models::{ArticleRecord, Digest, SummaryRecord};
use crate::utils::truncate_chars;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Summary used when an article could not be summarized.
pub const SENTINEL_SUMMARY: &str = "Summary unavailable due to an API error.";

/// Characters of article text included in a prompt.
pub const MAX_ARTICLE_CHARS: usize = 3000;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes sports articles.";

const INSTRUCTION: &str = "Summarize the following sports news article in 2–3 clear, objective, and \
professional-sounding sentences, suitable for inclusion in an email newsletter.";

pub const TEMPERATURE: f32 = 0.5;
pub const MAX_TOKENS: u32 = 200;

/// Build the user prompt for an article, truncating its text first.
pub fn build_prompt(article_text: &str) -> String {
    format!(
        "{INSTRUCTION}\n\nArticle:\n{}",
        truncate_chars(article_text, MAX_ARTICLE_CHARS)
    )
}

/// Name the first required field an article is missing, if any.
fn missing_field(article: &ArticleRecord) -> Option<&'static str> {
    if article.title.trim().is_empty() {
        Some("title")
    } else if article.url.trim().is_empty() {
        Some("url")
    } else if article.text.trim().is_empty() {
        Some("text")
    } else {
        None
    }
}

/// Summarizes articles through a [`CompletionClient`].
#[derive(Debug)]
pub struct Summarizer<C> {
    client: C,
    model: String,
    pause: Duration,
}

impl<C: CompletionClient> Summarizer<C> {
    /// Create a summarizer that waits `pause` between consecutive calls.
    pub fn new(client: C, model: impl Into<String>, pause: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            pause,
        }
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    fn request_for(&self, article: &ArticleRecord) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(&article.text)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Summarize one article. Never fails: errors become the sentinel.
    async fn summarize_one(&self, index: usize, article: &ArticleRecord) -> String {
        let t0 = Instant::now();
        match self.client.complete(&self.request_for(article)).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(index, elapsed_ms = t0.elapsed().as_millis() as u64, "Summarized article");
                text.trim().to_string()
            }
            Ok(_) => {
                warn!(index, title = %article.title, "Completion returned empty text; using sentinel");
                SENTINEL_SUMMARY.to_string()
            }
            Err(e) => {
                warn!(index, title = %article.title, error = %e, "Summarization failed; using sentinel");
                SENTINEL_SUMMARY.to_string()
            }
        }
    }

    /// Summarize every valid article, preserving input order.
    ///
    /// Articles with a blank title, URL or text are skipped and logged.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize(&self, articles: &[ArticleRecord]) -> Digest {
        let mut summaries = Vec::with_capacity(articles.len());

        for (index, article) in articles.iter().enumerate() {
            if let Some(field) = missing_field(article) {
                warn!(index, title = %article.title, field, "Skipping article with missing field");
                continue;
            }
            if !summaries.is_empty() && !self.pause.is_zero() {
                sleep(self.pause).await;
            }

            info!(index, title = %article.title, "Summarizing article");
            let summary = self.summarize_one(index, article).await;
            summaries.push(SummaryRecord {
                title: article.title.clone(),
                url: article.url.clone(),
                summary,
            });
        }

        let failed = summaries
            .iter()
            .filter(|s| s.summary == SENTINEL_SUMMARY)
            .count();
        info!(
            total = articles.len(),
            summarized = summaries.len() - failed,
            failed,
            skipped = articles.len() - summaries.len(),
            "Summarization complete"
        );
        summaries
    }
}
