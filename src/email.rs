use crate::config::{Credentials, EmailConfig};
use crate::models::Digest;
use crate::Result;
use lettre::{
    Message, Transport,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::SmtpTransport,
    transport::smtp::authentication::Credentials as SmtpCredentials,
};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Outbound delivery seam
pub trait Mailer {
    /// Deliver one digest to one recipient
    fn send(&self, digest: &Digest, from: &str, to: &str) -> Result<()>;
}

impl<M: Mailer + ?Sized> Mailer for &M {
    fn send(&self, digest: &Digest, from: &str, to: &str) -> Result<()> {
        (**self).send(digest, from, to)
    }
}

/// Definite result of a delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// SMTP relay over implicit TLS
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: SmtpCredentials,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig, credentials: &Credentials) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            credentials: SmtpCredentials::new(
                credentials.sender.clone(),
                credentials.secret.clone(),
            ),
        }
    }

    // No connection pool: each transport opens one session and closes it
    // once the send returns, whatever the outcome.
    fn create_transport(&self) -> Result<SmtpTransport> {
        let mailer = SmtpTransport::relay(&self.host)?
            .port(self.port)
            .credentials(self.credentials.clone())
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(mailer)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, digest: &Digest, from: &str, to: &str) -> Result<()> {
        let email = build_message(digest, from, to)?;
        let mailer = self.create_transport()?;

        mailer.send(&email)?;

        Ok(())
    }
}

/// Build a multipart/alternative message with a single plain-text part
pub fn build_message(digest: &Digest, from: &str, to: &str) -> Result<Message> {
    let email = Message::builder()
        .from(from.parse::<Mailbox>()?)
        .to(to.parse::<Mailbox>()?)
        .subject(digest.subject.as_str())
        .multipart(MultiPart::alternative().singlepart(SinglePart::plain(digest.body.clone())))?;

    Ok(email)
}

/// Send a digest, reporting instead of propagating any failure
pub fn deliver<M: Mailer + ?Sized>(
    mailer: &M,
    digest: &Digest,
    from: &str,
    to: &str,
) -> DeliveryOutcome {
    match mailer.send(digest, from, to) {
        Ok(()) => {
            tracing::info!("Email sent successfully to {}", to);
            DeliveryOutcome::Delivered
        }
        Err(e) => {
            tracing::error!("Failed to send email: {}", e);
            DeliveryOutcome::Failed(e.to_string())
        }
    }
}
