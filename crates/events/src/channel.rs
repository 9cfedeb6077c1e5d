//! The uniform alert-delivery contract.
//!
//! Every provider implements [`AlertChannel`]. The dispatcher only ever sees
//! `Box<dyn AlertChannel>`; which concrete channels exist is decided once at
//! startup from configuration.

use std::time::Duration;

use async_trait::async_trait;

use crate::delivery::email::EmailError;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a single channel failed to deliver a message.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status code.
    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The provider accepted the request but reported a failure in its body.
    #[error("Provider rejected message: {0}")]
    Rejected(String),

    /// SMTP delivery failed.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// The message bus client could not connect or publish.
    #[error("MQTT publish failed: {0}")]
    Mqtt(String),

    /// A signed request could not be built.
    #[error("Request signing failed: {0}")]
    Signing(String),

    /// The channel did not finish within the dispatcher's send timeout.
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The channel's send task panicked.
    #[error("Channel panicked: {0}")]
    Panicked(String),
}

// ---------------------------------------------------------------------------
// AlertChannel
// ---------------------------------------------------------------------------

/// One outbound notification provider.
///
/// Implementations own any provider-specific formatting (timestamp suffixes,
/// HTML bodies) and must not retry: the dispatcher treats each call as a
/// single best-effort attempt.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Stable identifier used in logs and delivery reports.
    fn name(&self) -> &'static str;

    /// Deliver `message` once.
    async fn send(&self, message: &str) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_display_http_status() {
        let err = DeliveryError::HttpStatus {
            status: 401,
            body: "invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned HTTP 401: invalid token");
    }

    #[test]
    fn delivery_error_display_timeout() {
        let err = DeliveryError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Delivery timed out after 30s");
    }

    #[test]
    fn delivery_error_wraps_email_error() {
        let err: DeliveryError = EmailError::Build("missing body".to_string()).into();
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
