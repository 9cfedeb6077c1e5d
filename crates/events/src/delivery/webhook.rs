//! Generic HTTP webhooks carrying the alert as `value1`.
//!
//! Two flavours share [`WebhookChannel`]: an IFTTT Maker trigger (form
//! encoded, URL built from event name and key) and an arbitrary URL that
//! receives `{"value1": "<message>"}` as JSON.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::channel::{AlertChannel, DeliveryError};
use crate::delivery::ensure_success;

const IFTTT_BASE_URL: &str = "https://maker.ifttt.com/trigger";

/// Characters left as-is inside a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The `[ifttt]` config block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IftttConfig {
    pub maker_channel_event: String,
    pub maker_channel_key: String,
}

impl IftttConfig {
    pub fn is_configured(&self) -> bool {
        !self.maker_channel_key.is_empty()
    }

    /// Trigger URL for the configured event and key.
    pub fn trigger_url(&self) -> String {
        format!(
            "{IFTTT_BASE_URL}/{}/with/key/{}",
            utf8_percent_encode(&self.maker_channel_event, PATH_SEGMENT),
            utf8_percent_encode(&self.maker_channel_key, PATH_SEGMENT),
        )
    }
}

/// The `[webhook]` config block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
}

impl WebhookConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

/// How the `value1` payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookBody {
    /// `application/x-www-form-urlencoded`
    Form,
    /// `application/json`
    Json,
}

/// POSTs `value1=<message>` to a fixed URL.
pub struct WebhookChannel {
    name: &'static str,
    url: String,
    body: WebhookBody,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// IFTTT Maker trigger, form encoded.
    pub fn ifttt(config: &IftttConfig, client: reqwest::Client) -> Self {
        Self {
            name: "ifttt",
            url: config.trigger_url(),
            body: WebhookBody::Form,
            client,
        }
    }

    /// Arbitrary endpoint, JSON encoded.
    pub fn generic(config: &WebhookConfig, client: reqwest::Client) -> Self {
        Self {
            name: "webhook",
            url: config.url.clone(),
            body: WebhookBody::Json,
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> WebhookBody {
        self.body
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let request = self.client.post(&self.url);
        let request = match self.body {
            WebhookBody::Form => request.form(&[("value1", message)]),
            WebhookBody::Json => request.json(&serde_json::json!({ "value1": message })),
        };
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}
