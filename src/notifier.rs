//! Digest delivery over SMTP.
//!
//! # Architecture
//!
//! - [`Notifier`]: renders a digest and hands one message to a transport
//! - [`MailTransport`]: trait for submitting an [`OutgoingMessage`]
//! - [`SmtpMailer`]: implicit-TLS authenticated submission via `lettre`
//! - [`ConsoleMailer`]: prints the message instead (`--dry-run`)
//!
//! A failed submission is classified into a [`DeliveryError`] and reported.
//! Nothing is retried.

use crate::error::DeliveryError;
use crate::models::SummaryRecord;
use crate::outputs::email::{BodyFormat, SUBJECT};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP reply codes that mean the server refused our credentials.
const AUTH_REJECTION_CODES: [&str; 4] = ["530", "534", "535", "538"];

/// A fully rendered message ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

impl OutgoingMessage {
    /// Convert to a `lettre` message with a single body part.
    pub fn to_lettre(&self) -> Result<Message, DeliveryError> {
        let content_type = match self.format {
            BodyFormat::Plain => ContentType::TEXT_PLAIN,
            BodyFormat::Html => ContentType::TEXT_HTML,
        };
        let builder = self
            .to
            .iter()
            .cloned()
            .fold(Message::builder().from(self.from.clone()), |b, to| b.to(to));
        builder
            .subject(self.subject.clone())
            .header(content_type)
            .body(self.body.clone())
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

/// Something that can submit one message to all of its recipients.
pub trait MailTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError>;
}

/// Authenticated implicit-TLS SMTP submission.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SmtpMailer {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
        }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| DeliveryError::Connection(e.to_string()))?
            .port(self.port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

impl MailTransport for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(host = %self.host, port = self.port, recipients = message.to.len()))]
    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        let email = message.to_lettre()?;
        let transport = self.transport()?;

        let t0 = Instant::now();
        match transport.send(email).await {
            Ok(response) => {
                info!(
                    code = %response.code(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Mail server accepted message"
                );
                Ok(())
            }
            Err(e) => {
                let err = classify_smtp_error(&e);
                error!(error = %e, kind = ?err, "SMTP submission failed");
                Err(err)
            }
        }
    }
}

/// Whether an SMTP reply code means the credentials were refused.
pub fn is_auth_rejection(code: &str) -> bool {
    AUTH_REJECTION_CODES.contains(&code)
}

/// Sort a `lettre` SMTP error into authentication, connection or other.
fn classify_smtp_error(e: &lettre::transport::smtp::Error) -> DeliveryError {
    let code = e.status().map(|c| c.to_string());
    let kind = SmtpFailure {
        code: code.as_deref(),
        timeout: e.is_timeout(),
        tls: e.is_tls(),
        protocol: e.is_client() || e.is_response(),
    };
    kind.classify(e.to_string())
}

/// The facts about a failed submission that decide its [`DeliveryError`].
#[derive(Debug, Clone, Copy, Default)]
struct SmtpFailure<'a> {
    /// Reply code, when the server answered.
    code: Option<&'a str>,
    timeout: bool,
    tls: bool,
    /// Malformed reply or client-side misuse.
    protocol: bool,
}

impl SmtpFailure<'_> {
    fn classify(self, detail: String) -> DeliveryError {
        match self.code {
            Some(code) if is_auth_rejection(code) => DeliveryError::Authentication(detail),
            Some(_) => DeliveryError::Unspecified(detail),
            None if self.timeout || self.tls => DeliveryError::Connection(detail),
            None if self.protocol => DeliveryError::Unspecified(detail),
            // Remaining kinds are socket and connection failures
            None => DeliveryError::Connection(detail),
        }
    }
}

/// Prints messages to stdout instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

impl MailTransport for ConsoleMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        let to = message
            .to
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("From: {}", message.from);
        println!("To: {to}");
        println!("Subject: {}", message.subject);
        println!();
        println!("{}", message.body);
        info!("Dry run: message printed, not sent");
        Ok(())
    }
}

/// The transport selected by configuration.
#[derive(Debug)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Console(ConsoleMailer),
}

impl MailTransport for Mailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        match self {
            Mailer::Smtp(m) => m.send(message).await,
            Mailer::Console(m) => m.send(message).await,
        }
    }
}

/// Renders a digest and submits it through a [`MailTransport`].
#[derive(Debug)]
pub struct Notifier<T> {
    transport: T,
    sender: Mailbox,
    format: BodyFormat,
}

impl<T: MailTransport> Notifier<T> {
    pub fn new(transport: T, sender: Mailbox, format: BodyFormat) -> Self {
        Self {
            transport,
            sender,
            format,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the single outbound message for `digest`.
    pub fn compose(&self, digest: &[SummaryRecord], recipients: &[Mailbox]) -> OutgoingMessage {
        OutgoingMessage {
            from: self.sender.clone(),
            to: recipients.to_vec(),
            subject: SUBJECT.to_string(),
            body: self.format.render(digest),
            format: self.format,
        }
    }

    /// Render `digest` and send it to every recipient in one submission.
    #[instrument(level = "info", skip_all, fields(articles = digest.len(), recipients = recipients.len()))]
    pub async fn render_and_send(
        &self,
        digest: &[SummaryRecord],
        recipients: &[Mailbox],
    ) -> Result<(), DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::Message("no recipients".to_string()));
        }
        let message = self.compose(digest, recipients);
        self.transport.send(&message).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::outputs::email::NO_NEWS;
    use std::sync::Mutex;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Test double that records every message and replies with a fixed result.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingMessage>>,
        pub fail_with: Mutex<Option<DeliveryError>>,
    }

    impl MailTransport for RecordingMailer {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(message.clone());
            match self.fail_with.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    pub(crate) fn mailbox(addr: &str) -> Mailbox {
        addr.parse().unwrap()
    }

    fn record(title: &str) -> SummaryRecord {
        SummaryRecord {
            title: title.to_string(),
            url: "https://example.com".to_string(),
            summary: "Summary.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_render_and_send_single_submission() {
        let notifier = Notifier::new(
            RecordingMailer::default(),
            mailbox("sender@example.com"),
            BodyFormat::Html,
        );
        let recipients = vec![mailbox("a@example.com"), mailbox("b@example.com")];

        notifier
            .render_and_send(&[record("One"), record("Two")], &recipients)
            .await
            .unwrap();

        let sent = notifier.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, SUBJECT);
        assert_eq!(sent[0].from, mailbox("sender@example.com"));
        assert_eq!(sent[0].to, recipients);
        assert_eq!(sent[0].body.matches("<div class=\"article\">").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_digest_sends_placeholder() {
        let notifier = Notifier::new(
            RecordingMailer::default(),
            mailbox("sender@example.com"),
            BodyFormat::Plain,
        );
        notifier
            .render_and_send(&[], &[mailbox("a@example.com")])
            .await
            .unwrap();
        let sent = notifier.transport().sent.lock().unwrap();
        assert!(sent[0].body.contains(NO_NEWS));
    }

    #[tokio::test]
    async fn test_no_recipients_is_rejected_before_transport() {
        let notifier = Notifier::new(
            RecordingMailer::default(),
            mailbox("sender@example.com"),
            BodyFormat::Plain,
        );
        let err = notifier.render_and_send(&[record("One")], &[]).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Message(_)));
        assert!(notifier.transport().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let mailer = RecordingMailer::default();
        *mailer.fail_with.lock().unwrap() = Some(DeliveryError::Authentication("535".into()));
        let notifier = Notifier::new(mailer, mailbox("sender@example.com"), BodyFormat::Plain);

        let err = notifier
            .render_and_send(&[record("One")], &[mailbox("a@example.com")])
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Authentication(_)));
    }

    #[test]
    fn test_to_lettre_builds_message() {
        let message = OutgoingMessage {
            from: mailbox("Sports Digest <sender@example.com>"),
            to: vec![mailbox("a@example.com"), mailbox("b@example.com")],
            subject: SUBJECT.to_string(),
            body: "<p>hi</p>".to_string(),
            format: BodyFormat::Html,
        };
        let email = message.to_lettre().unwrap();
        let envelope = email.envelope();
        assert_eq!(envelope.to().len(), 2);
        let formatted = String::from_utf8(email.formatted()).unwrap();
        assert!(formatted.contains("Subject: Your AI Sports News Roundup"));
        assert!(formatted.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_auth_rejection_codes() {
        assert!(is_auth_rejection("535"));
        assert!(is_auth_rejection("534"));
        assert!(!is_auth_rejection("550"));
        assert!(!is_auth_rejection("421"));
    }

    #[test]
    fn test_classify_reply_codes() {
        let auth = SmtpFailure {
            code: Some("535"),
            ..Default::default()
        };
        assert!(matches!(
            auth.classify("bad credentials".into()),
            DeliveryError::Authentication(_)
        ));

        let rejected = SmtpFailure {
            code: Some("550"),
            ..Default::default()
        };
        assert!(matches!(
            rejected.classify("mailbox unavailable".into()),
            DeliveryError::Unspecified(_)
        ));
    }

    #[test]
    fn test_classify_without_reply_code() {
        let timeout = SmtpFailure {
            timeout: true,
            ..Default::default()
        };
        assert!(matches!(timeout.classify("t".into()), DeliveryError::Connection(_)));

        let tls = SmtpFailure {
            tls: true,
            ..Default::default()
        };
        assert!(matches!(tls.classify("t".into()), DeliveryError::Connection(_)));

        let protocol = SmtpFailure {
            protocol: true,
            ..Default::default()
        };
        assert!(matches!(protocol.classify("p".into()), DeliveryError::Unspecified(_)));

        let socket = SmtpFailure::default();
        match socket.classify("refused".into()) {
            DeliveryError::Connection(detail) => assert_eq!(detail, "refused"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn outgoing() -> OutgoingMessage {
        OutgoingMessage {
            from: mailbox("sender@example.com"),
            to: vec![mailbox("a@example.com")],
            subject: SUBJECT.to_string(),
            body: "hi".to_string(),
            format: BodyFormat::Plain,
        }
    }

    #[tokio::test]
    async fn test_smtp_refused_port_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mailer = SmtpMailer::new("127.0.0.1", port, "sender@example.com", "pw");
        let err = mailer.send(&outgoing()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Connection(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_smtp_plaintext_server_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = socket.write_all(b"220 localhost ESMTP ready\r\n").await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let mailer = SmtpMailer::new("127.0.0.1", port, "sender@example.com", "pw");
        let err = mailer.send(&outgoing()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Connection(_)), "got {err:?}");
        server.abort();
    }

    #[test]
    fn test_smtp_mailer_debug_redacts_password() {
        let mailer = SmtpMailer::new("smtp.example.com", 465, "me@example.com", "hunter2");
        let debug = format!("{mailer:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
