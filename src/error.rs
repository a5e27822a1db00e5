//! Error types for each pipeline stage.
//!
//! The taxonomy follows how far a failure is allowed to travel:
//!
//! | Error | Raised by | Effect on the run |
//! |-------|-----------|-------------------|
//! | [`ConfigError`] | startup | run never starts, non-zero exit |
//! | [`ProviderError`] | news fetch | run ends, no email sent |
//! | [`CompletionError`] | one completion call | absorbed, sentinel summary substituted |
//! | [`DeliveryError`] | SMTP submission | reported, never retried |

use thiserror::Error;

/// Configuration could not be resolved at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid email address {address:?} in {field}: {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("output directory {path} is not usable: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The news provider could not produce a usable result set.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("news request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("news provider response had no `{0}` list")]
    MissingResults(&'static str),

    #[error("news provider response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid news provider URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A single completion call failed. Never escapes the summarizer.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion provider error: {0}")]
    Provider(String),

    #[error("completion response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("completion returned no text")]
    Empty,
}

/// Submitting the digest email failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("authentication rejected by mail server: {0}")]
    Authentication(String),

    #[error("could not connect to mail server: {0}")]
    Connection(String),

    #[error("mail submission failed: {0}")]
    Unspecified(String),

    #[error("could not build email message: {0}")]
    Message(String),
}
