//! The fetch → summarize → deliver driver.
//!
//! Each stage runs to completion before the next starts. The run stops
//! early, without sending mail, when the fetch fails or when no article
//! survives to the digest. Every way a run can end is a [`RunOutcome`],
//! which maps to exactly one diagnostic line for the operator.

use crate::api::CompletionClient;
use crate::error::{DeliveryError, ProviderError};
use crate::models::{Digest, TimeRange};
use crate::notifier::{MailTransport, Notifier};
use crate::outputs::json::{DigestArchive, write_digest};
use crate::sources::ArticleSource;
use crate::summarizer::Summarizer;
use chrono::Local;
use lettre::message::Mailbox;
use std::fmt;
use tracing::{error, info, instrument, warn};

/// Per-run inputs that don't belong to any one stage.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub window: TimeRange,
    pub limit: usize,
    pub recipients: Vec<Mailbox>,
    pub json_output_dir: Option<String>,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The digest was handed to the mail server.
    Sent { articles: usize },
    /// Nothing worth sending; no mail was attempted.
    NothingToSend { reason: &'static str },
    /// The news provider failed; no mail was attempted.
    FetchFailed(ProviderError),
    /// Submission failed after the digest was built.
    DeliveryFailed(DeliveryError),
}

impl RunOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, RunOutcome::Sent { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Sent { articles } => {
                write!(f, "✅ Digest sent with {articles} article(s).")
            }
            RunOutcome::NothingToSend { reason } => {
                write!(f, "ℹ️ Nothing to send: {reason}.")
            }
            RunOutcome::FetchFailed(e) => write!(f, "❌ Fetch stage failed: {e}"),
            RunOutcome::DeliveryFailed(e) => write!(f, "❌ Delivery stage failed: {e}"),
        }
    }
}

/// Run the whole pipeline once.
#[instrument(level = "info", skip_all, fields(source = source.name(), limit = settings.limit))]
pub async fn run<S, C, T>(
    source: &S,
    summarizer: &Summarizer<C>,
    notifier: &Notifier<T>,
    settings: &RunSettings,
) -> RunOutcome
where
    S: ArticleSource,
    C: CompletionClient,
    T: MailTransport,
{
    // ---- Fetch ----
    let articles = match source
        .fetch_recent_articles(settings.window, settings.limit)
        .await
    {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Fetch failed; aborting run");
            return RunOutcome::FetchFailed(e);
        }
    };
    if articles.is_empty() {
        info!("No articles fetched; nothing to send");
        return RunOutcome::NothingToSend {
            reason: "no sports articles in the last 24 hours",
        };
    }
    info!(count = articles.len(), "Fetched articles");

    // ---- Summarize ----
    let digest: Digest = summarizer.summarize(&articles).await;
    if digest.is_empty() {
        warn!(fetched = articles.len(), "No article had usable content");
        return RunOutcome::NothingToSend {
            reason: "no fetched article had usable content",
        };
    }

    // ---- Archive ----
    if let Some(dir) = settings.json_output_dir.as_deref() {
        let archive = DigestArchive::new(Local::now(), &digest);
        if let Err(e) = write_digest(&archive, dir).await {
            error!(error = %e, "Failed to write digest archive; continuing with delivery");
        }
    }

    // ---- Deliver ----
    match notifier.render_and_send(&digest, &settings.recipients).await {
        Ok(()) => {
            info!(articles = digest.len(), "Digest delivered");
            RunOutcome::Sent {
                articles: digest.len(),
            }
        }
        Err(e) => {
            error!(error = %e, "Delivery failed");
            RunOutcome::DeliveryFailed(e)
        }
    }
}
