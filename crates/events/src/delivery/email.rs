//! Email alert delivery via SMTP.
//!
//! [`EmailChannel`] wraps the `lettre` async SMTP transport. The alert text
//! becomes the subject line and an HTML body (with a plain-text
//! alternative). The connection is upgraded with STARTTLS and authenticated
//! with the sender address and password.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use crate::channel::{AlertChannel, DeliveryError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// The `[email]` config block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Where alerts are sent. Empty disables the channel.
    pub recipient: String,
    /// "From" address, also used as the SMTP username.
    pub sender: String,
    /// SMTP password for `sender`.
    pub password: String,
    /// SMTP relay hostname.
    pub server: String,
    /// SMTP port (defaults to 587).
    pub port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            sender: String::new(),
            password: String::new(),
            server: String::new(),
            port: DEFAULT_SMTP_PORT,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        !self.recipient.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EmailChannel
// ---------------------------------------------------------------------------

/// Sends alert emails via SMTP.
pub struct EmailChannel {
    config: EmailConfig,
}

impl EmailChannel {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Assemble the MIME message for `alert` without sending it.
    pub fn build_message(&self, alert: &str) -> Result<Message, EmailError> {
        let from: Mailbox = self.config.sender.parse()?;
        let to: Mailbox = self.config.recipient.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(alert)
            .multipart(MultiPart::alternative_plain_html(
                alert.to_string(),
                format!("<h3>{}</h3>", escape_html(alert)),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn deliver(&self, alert: &str) -> Result<(), EmailError> {
        let email = self.build_message(alert)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.sender.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(email).await?;

        tracing::info!(to = %self.config.recipient, "Alert email sent");
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        Ok(self.deliver(message).await?)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            recipient: "owner@example.com".to_string(),
            sender: "washer@example.com".to_string(),
            password: "secret".to_string(),
            server: "smtp.example.com".to_string(),
            port: DEFAULT_SMTP_PORT,
        }
    }

    #[test]
    fn default_config_is_disabled() {
        let cfg = EmailConfig::default();
        assert!(!cfg.is_configured());
        assert_eq!(cfg.port, 587);
    }

    #[test]
    fn build_message_uses_alert_as_subject_and_html_body() {
        let channel = EmailChannel::new(config());
        let message = channel
            .build_message("Washer finished")
            .expect("message should build");
        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");

        assert!(raw.contains("Subject: Washer finished"));
        assert!(raw.contains("<h3>Washer finished</h3>"));
        assert!(raw.contains("To: owner@example.com"));
    }

    #[test]
    fn build_message_rejects_bad_recipient() {
        let mut cfg = config();
        cfg.recipient = "not-an-email".to_string();
        let err = EmailChannel::new(cfg).build_message("x").unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
