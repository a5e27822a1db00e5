//! Process-wide configuration, resolved once from [`Cli`] and immutable after.
//!
//! Resolution fails fast: every missing required value is collected into a
//! single [`ConfigError::Missing`] before any network call is made.

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::outputs::email::BodyFormat;
use lettre::message::Mailbox;
use std::fmt;
use std::time::Duration;

/// Sender used for `--dry-run` when none is configured.
const DRY_RUN_SENDER: &str = "Sports Digest <digest@example.com>";

/// Which news provider to query, with its key.
#[derive(Clone, PartialEq, Eq)]
pub enum NewsProvider {
    Guardian(String),
    NewsApi(String),
}

impl fmt::Debug for NewsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsProvider::Guardian(_) => f.write_str("Guardian(<redacted>)"),
            NewsProvider::NewsApi(_) => f.write_str("NewsApi(<redacted>)"),
        }
    }
}

/// SMTP submission settings. Absent for dry runs without credentials.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub news: NewsProvider,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub sender: Mailbox,
    pub recipients: Vec<Mailbox>,
    pub smtp: Option<SmtpSettings>,
    pub limit: usize,
    pub format: BodyFormat,
    pub pause: Duration,
    pub json_output_dir: Option<String>,
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("news", &self.news)
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("sender", &self.sender.email.to_string())
            .field("recipients", &self.recipients.len())
            .field("smtp", &self.smtp)
            .field("limit", &self.limit)
            .field("format", &self.format)
            .field("pause", &self.pause)
            .field("json_output_dir", &self.json_output_dir)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Treat blank values the same as unset ones.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_mailbox(field: &'static str, address: &str) -> Result<Mailbox, ConfigError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| ConfigError::InvalidAddress {
            field,
            address: address.trim().to_string(),
            reason: e.to_string(),
        })
}

/// Parse a comma-separated recipient list, ignoring empty entries.
pub fn parse_recipients(list: &str) -> Result<Vec<Mailbox>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| parse_mailbox("RECIPIENT_EMAIL", a))
        .collect()
}

impl Config {
    /// Resolve and validate configuration from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        let news = match (present(&cli.guardian_api_key), present(&cli.news_api_key)) {
            (Some(key), _) => Some(NewsProvider::Guardian(key)),
            (None, Some(key)) => Some(NewsProvider::NewsApi(key)),
            (None, None) => {
                missing.push("GUARDIAN_API_KEY or NEWS_API_KEY");
                None
            }
        };

        let openai_api_key = present(&cli.openai_api_key);
        if openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }

        let sender_email = present(&cli.sender_email);
        let app_password = present(&cli.app_password);
        let recipient_email = present(&cli.recipient_email);
        if !cli.dry_run {
            if sender_email.is_none() {
                missing.push("SENDER_EMAIL");
            }
            if app_password.is_none() {
                missing.push("APP_PASSWORD");
            }
            if recipient_email.is_none() {
                missing.push("RECIPIENT_EMAIL");
            }
        }

        let (Some(news), Some(openai_api_key)) = (news, openai_api_key) else {
            return Err(ConfigError::Missing(missing));
        };
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let sender = match &sender_email {
            Some(address) => parse_mailbox("SENDER_EMAIL", address)?,
            None => parse_mailbox("SENDER_EMAIL", DRY_RUN_SENDER)?,
        };
        let mut recipients = match &recipient_email {
            Some(list) => parse_recipients(list)?,
            None => Vec::new(),
        };
        if recipients.is_empty() {
            if !cli.dry_run {
                return Err(ConfigError::Missing(vec!["RECIPIENT_EMAIL"]));
            }
            recipients.push(sender.clone());
        }

        let smtp = match (&sender_email, app_password) {
            (Some(_), Some(password)) => Some(SmtpSettings {
                host: cli.smtp_host.clone(),
                port: cli.smtp_port,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            news,
            openai_api_key,
            openai_base_url: cli.openai_base_url.clone(),
            model: cli.model.clone(),
            sender,
            recipients,
            smtp,
            limit: usize::from(cli.limit),
            format: cli.format,
            pause: Duration::from_millis(cli.pause_ms),
            json_output_dir: cli.json_output_dir.clone(),
            dry_run: cli.dry_run,
        })
    }

    /// The SMTP login, which is the sender's bare address.
    pub fn smtp_username(&self) -> String {
        self.sender.email.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DEFAULT_MODEL, OPENAI_BASE_URL};

    fn cli() -> Cli {
        Cli {
            guardian_api_key: Some("guardian".to_string()),
            news_api_key: None,
            openai_api_key: Some("openai".to_string()),
            openai_base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sender_email: Some("sender@example.com".to_string()),
            app_password: Some("app-password".to_string()),
            recipient_email: Some("a@example.com, b@example.com".to_string()),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            limit: 5,
            format: BodyFormat::Html,
            pause_ms: 1000,
            json_output_dir: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_full_config_resolves() {
        let config = Config::from_cli(&cli()).unwrap();
        assert_eq!(config.news, NewsProvider::Guardian("guardian".to_string()));
        assert_eq!(config.recipients.len(), 2);
        assert_eq!(config.recipients[1].email.to_string(), "b@example.com");
        assert_eq!(config.smtp_username(), "sender@example.com");
        assert_eq!(config.pause, Duration::from_secs(1));
        assert_eq!(config.limit, 5);
        assert_eq!(config.smtp.as_ref().unwrap().port, 465);
    }

    #[test]
    fn test_newsapi_used_without_guardian_key() {
        let mut args = cli();
        args.guardian_api_key = Some("  ".to_string());
        args.news_api_key = Some("newsapi".to_string());
        let config = Config::from_cli(&args).unwrap();
        assert_eq!(config.news, NewsProvider::NewsApi("newsapi".to_string()));
    }

    #[test]
    fn test_missing_values_reported_together() {
        let mut args = cli();
        args.guardian_api_key = None;
        args.openai_api_key = None;
        args.app_password = Some(String::new());

        match Config::from_cli(&args).unwrap_err() {
            ConfigError::Missing(fields) => assert_eq!(
                fields,
                vec!["GUARDIAN_API_KEY or NEWS_API_KEY", "OPENAI_API_KEY", "APP_PASSWORD"]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mail_values_missing_alone() {
        let mut args = cli();
        args.sender_email = None;
        match Config::from_cli(&args).unwrap_err() {
            ConfigError::Missing(fields) => assert_eq!(fields, vec!["SENDER_EMAIL"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_recipient() {
        let mut args = cli();
        args.recipient_email = Some("a@example.com, not-an-address".to_string());
        match Config::from_cli(&args).unwrap_err() {
            ConfigError::InvalidAddress { field, address, .. } => {
                assert_eq!(field, "RECIPIENT_EMAIL");
                assert_eq!(address, "not-an-address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_recipient_list_of_commas_is_missing() {
        let mut args = cli();
        args.recipient_email = Some(" , ,".to_string());
        assert!(matches!(
            Config::from_cli(&args).unwrap_err(),
            ConfigError::Missing(_)
        ));
    }

    #[test]
    fn test_dry_run_needs_no_mail_credentials() {
        let mut args = cli();
        args.dry_run = true;
        args.sender_email = None;
        args.app_password = None;
        args.recipient_email = None;

        let config = Config::from_cli(&args).unwrap();
        assert!(config.smtp.is_none());
        assert_eq!(config.recipients, vec![config.sender.clone()]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_cli(&cli()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("app-password"));
        assert!(!debug.contains("openai\""));
        assert!(!debug.contains("guardian\""));
    }

    #[test]
    fn test_parse_recipients_with_display_names() {
        let recipients = parse_recipients("Fan <fan@example.com>,coach@example.com").unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].name.as_deref(), Some("Fan"));
    }
}
