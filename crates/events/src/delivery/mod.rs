//! Concrete alert channels, one module per provider.
//!
//! Each module exposes a `*Config` block (deserialized from the agent's
//! config file, every field optional) and a channel type implementing
//! [`AlertChannel`](crate::channel::AlertChannel). A channel is only built
//! when its config reports `is_configured()`.

use std::time::Duration;

use crate::channel::DeliveryError;

pub mod email;
pub mod mqtt;
pub mod pushbullet;
pub mod pushover;
pub mod slack;
pub mod twitter;
pub mod webhook;

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all HTTP-based channels.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build reqwest HTTP client")
}

/// Turn a non-2xx response into [`DeliveryError::HttpStatus`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

/// Append a local timestamp so providers that reject duplicate content
/// accept repeated start/end messages.
pub(crate) fn with_timestamp(message: &str) -> String {
    format!(
        "{message} {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_builds() {
        let _client = http_client();
    }

    #[test]
    fn timestamp_suffix_keeps_message_prefix() {
        let stamped = with_timestamp("Dryer finished");
        assert!(stamped.starts_with("Dryer finished "));
        // "YYYY-mm-dd HH:MM:SS"
        let suffix = &stamped["Dryer finished ".len()..];
        assert_eq!(suffix.len(), 19);
        assert_eq!(&suffix[4..5], "-");
        assert_eq!(&suffix[10..11], " ");
    }
}
