//! News providers the digest can be fetched from.
//!
//! Each provider turns one HTTP GET into a list of [`ArticleRecord`]s,
//! translating its own field names at this boundary.
//!
//! # Supported Providers
//!
//! | Provider | Module | Endpoint | Window |
//! |----------|--------|----------|--------|
//! | The Guardian | [`guardian`] | Content API `/search`, `section=sport` | `from-date`/`to-date` query |
//! | NewsAPI | [`newsapi`] | `/v2/top-headlines`, `category=sports` | filtered on `publishedAt` |
//!
//! # Failure Policy
//!
//! A non-success status or a body without the expected result list is a
//! [`ProviderError`]. An empty result list is not an error.

pub mod guardian;
pub mod newsapi;

use crate::error::ProviderError;
use crate::models::{ArticleRecord, TimeRange};

pub use guardian::GuardianSource;
pub use newsapi::NewsApiSource;

/// Fallback diagnostic when a provider fails without saying why.
pub const GENERIC_FAILURE: &str = "news provider request failed without an error message";

/// Something that can list recent sports articles.
pub trait ArticleSource {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Fetch at most `limit` articles published within `window`, newest first.
    async fn fetch_recent_articles(
        &self,
        window: TimeRange,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, ProviderError>;
}

/// The provider selected by configuration.
#[derive(Debug)]
pub enum NewsSource {
    Guardian(GuardianSource),
    NewsApi(NewsApiSource),
}

impl ArticleSource for NewsSource {
    fn name(&self) -> &'static str {
        match self {
            NewsSource::Guardian(s) => s.name(),
            NewsSource::NewsApi(s) => s.name(),
        }
    }

    async fn fetch_recent_articles(
        &self,
        window: TimeRange,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, ProviderError> {
        match self {
            NewsSource::Guardian(s) => s.fetch_recent_articles(window, limit).await,
            NewsSource::NewsApi(s) => s.fetch_recent_articles(window, limit).await,
        }
    }
}

/// Map a non-success status to a [`ProviderError`], preferring the
/// provider's own message.
pub(crate) fn status_error(status: u16, message: Option<String>) -> ProviderError {
    ProviderError::Status {
        status,
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    }
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
