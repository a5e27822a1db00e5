//! Data models passed between pipeline stages.
//!
//! - [`ArticleRecord`]: a fetched article with plain-text body
//! - [`SummaryRecord`]: an article after summarization
//! - [`Digest`]: the ordered summaries for one run
//! - [`TimeRange`]: the trailing window a fetch is scoped to
//!
//! Provider-specific field names never reach these types; each source
//! translates its wire format through [`ArticleRecord::from_parts`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Title used when the provider omits one.
pub const UNTITLED: &str = "Untitled";

/// Link used when the provider omits a canonical URL.
pub const MISSING_URL: &str = "#";

/// A fetched article, normalized to the internal schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// The article headline.
    pub title: String,
    /// The canonical article URL.
    pub url: String,
    /// Plain-text body. May be empty.
    pub text: String,
}

impl ArticleRecord {
    /// Build a record from optional provider fields, applying the defaults.
    ///
    /// A blank title becomes [`UNTITLED`], a blank URL becomes
    /// [`MISSING_URL`] and a missing body becomes empty text.
    pub fn from_parts(title: Option<String>, url: Option<String>, text: Option<String>) -> Self {
        fn non_blank(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        Self {
            title: non_blank(title).unwrap_or_else(|| UNTITLED.to_string()),
            url: non_blank(url).unwrap_or_else(|| MISSING_URL.to_string()),
            text: text.map(|t| t.trim().to_string()).unwrap_or_default(),
        }
    }
}

/// A summarized article ready for rendering. `summary` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub title: String,
    pub url: String,
    pub summary: String,
}

/// Summaries selected for a single run, in fetch order.
pub type Digest = Vec<SummaryRecord>;

/// A closed time interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// The window ending at `now` and reaching back `lookback`.
    pub fn trailing(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: now - lookback,
            end: now,
        }
    }

    /// The trailing 24 hours ending now.
    pub fn last_day() -> Self {
        Self::trailing(Utc::now(), Duration::hours(24))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_parts_applies_defaults() {
        let article = ArticleRecord::from_parts(None, Some("   ".to_string()), None);
        assert_eq!(article.title, UNTITLED);
        assert_eq!(article.url, MISSING_URL);
        assert_eq!(article.text, "");
    }

    #[test]
    fn test_from_parts_keeps_values() {
        let article = ArticleRecord::from_parts(
            Some(" Arsenal win the derby ".to_string()),
            Some("https://example.com/a".to_string()),
            Some("Body text".to_string()),
        );
        assert_eq!(article.title, "Arsenal win the derby");
        assert_eq!(article.url, "https://example.com/a");
        assert_eq!(article.text, "Body text");
    }

    #[test]
    fn test_trailing_window() {
        let now = Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap();
        let window = TimeRange::trailing(now, Duration::hours(24));
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 5, 5, 12, 0, 0).unwrap());
        assert!(window.contains(now));
        assert!(window.contains(window.start));
        assert!(!window.contains(now + Duration::seconds(1)));
        assert!(!window.contains(window.start - Duration::seconds(1)));
    }

    #[test]
    fn test_summary_record_serialization() {
        let record = SummaryRecord {
            title: "Title".to_string(),
            url: "https://example.com".to_string(),
            summary: "Summary".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"summary\":\"Summary\""));
    }
}
