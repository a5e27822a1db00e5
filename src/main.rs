//! # Sports Digest
//!
//! Fetches the last 24 hours of sports news, summarizes each article with an
//! LLM, and emails the digest to a list of recipients.
//!
//! ## Usage
//!
//! ```sh
//! GUARDIAN_API_KEY=... OPENAI_API_KEY=... \
//! SENDER_EMAIL=me@gmail.com APP_PASSWORD=... RECIPIENT_EMAIL=a@x.com,b@y.com \
//! sports_digest
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly sequential pipeline:
//! 1. **Fetching**: Query the news provider for recent sports articles
//! 2. **Summarizing**: One completion call per article, failures become a sentinel summary
//! 3. **Delivering**: Render the digest and submit it in one SMTP transmission
//!
//! Configuration is resolved and validated before any network call.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod notifier;
mod outputs;
mod pipeline;
mod sources;
mod summarizer;
mod utils;

use api::OpenAiClient;
use cli::Cli;
use config::{Config, NewsProvider};
use error::ConfigError;
use models::TimeRange;
use notifier::{ConsoleMailer, Mailer, Notifier, SmtpMailer};
use pipeline::RunSettings;
use sources::{GuardianSource, NewsApiSource, NewsSource};
use summarizer::Summarizer;
use utils::ensure_writable_dir;

/// Upper bound on every news and completion request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The single line printed when configuration can't be resolved.
fn config_diagnostic(e: &ConfigError) -> String {
    format!("❌ Configuration error: {e}")
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("sports_digest starting up");

    // ---- Configuration ----
    let args = Cli::parse();
    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error; nothing was fetched or sent");
            println!("{}", config_diagnostic(&e));
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!(?config, "Resolved configuration");

    if let Some(dir) = config.json_output_dir.as_deref() {
        if let Err(source) = ensure_writable_dir(dir).await {
            let e = ConfigError::OutputDir {
                path: dir.to_string(),
                source,
            };
            error!(error = %e, "JSON output directory is not writable (fix perms or choose a different path)");
            println!("{}", config_diagnostic(&e));
            return Ok(ExitCode::FAILURE);
        }
    }

    // ---- Collaborators ----
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;

    let source = match &config.news {
        NewsProvider::Guardian(key) => NewsSource::Guardian(GuardianSource::new(http.clone(), key)),
        NewsProvider::NewsApi(key) => NewsSource::NewsApi(NewsApiSource::new(http.clone(), key)),
    };
    let summarizer = Summarizer::new(
        OpenAiClient::new(http, &config.openai_api_key, &config.openai_base_url),
        &config.model,
        config.pause,
    );
    let mailer = match (config.dry_run, &config.smtp) {
        (false, Some(smtp)) => Mailer::Smtp(SmtpMailer::new(
            &smtp.host,
            smtp.port,
            config.smtp_username(),
            &smtp.password,
        )),
        _ => Mailer::Console(ConsoleMailer),
    };
    let notifier = Notifier::new(mailer, config.sender.clone(), config.format);
    info!(
        model = %config.model,
        limit = config.limit,
        recipients = config.recipients.len(),
        dry_run = config.dry_run,
        "Pipeline configured"
    );

    // ---- Run ----
    let settings = RunSettings {
        window: TimeRange::last_day(),
        limit: config.limit,
        recipients: config.recipients.clone(),
        json_output_dir: config.json_output_dir.clone(),
    };
    let outcome = pipeline::run(&source, &summarizer, &notifier, &settings).await;

    if config.dry_run && outcome.is_sent() {
        println!("ℹ️ Dry run complete: digest printed, not sent.");
    } else {
        println!("{outcome}");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(ExitCode::SUCCESS)
}
