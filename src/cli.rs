//! Command-line interface definitions for Sports Digest.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it. Values are resolved into a [`crate::config::Config`]
//! once at startup.

use crate::api::{DEFAULT_MODEL, OPENAI_BASE_URL};
use crate::notifier::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};
use crate::outputs::email::BodyFormat;
use clap::Parser;

/// Command-line arguments for the Sports Digest application.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment
/// sports_digest
///
/// # Preview the email without sending it
/// sports_digest --dry-run --format plain
///
/// # Keep a JSON copy of each digest
/// sports_digest --json-output-dir ./digests
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Guardian Content API key (preferred news provider)
    #[arg(long, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    pub guardian_api_key: Option<String>,

    /// NewsAPI key, used when no Guardian key is set
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// API key for the chat-completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_BASE_URL)]
    pub openai_base_url: String,

    /// Model used for summaries
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Address the digest is sent from; also the SMTP login
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// App-specific SMTP password for the sender account
    #[arg(long, env = "APP_PASSWORD", hide_env_values = true)]
    pub app_password: Option<String>,

    /// Comma-separated list of recipient addresses
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub recipient_email: Option<String>,

    /// SMTP submission host (implicit TLS)
    #[arg(long, env = "SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    pub smtp_host: String,

    /// SMTP submission port
    #[arg(long, env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    /// Maximum number of articles in the digest
    #[arg(short, long, env = "DIGEST_LIMIT", default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=50))]
    pub limit: u8,

    /// Email body format
    #[arg(short, long, env = "DIGEST_FORMAT", value_enum, default_value_t = BodyFormat::Html)]
    pub format: BodyFormat,

    /// Pause between completion calls, in milliseconds
    #[arg(long, env = "SUMMARY_PAUSE_MS", default_value_t = 1000)]
    pub pause_ms: u64,

    /// Optional directory for a JSON archive of each digest
    #[arg(short, long, env = "JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,

    /// Print the email instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}
