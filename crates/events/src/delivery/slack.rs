//! Slack delivery: the Web API (`chat.postMessage`) and incoming webhooks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::channel::{AlertChannel, DeliveryError};
use crate::delivery::{ensure_success, with_timestamp};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Channel posted to when none is configured.
const DEFAULT_SLACK_CHANNEL: &str = "#random";

/// The `[slack]` config block. The API token and the webhook URL enable two
/// separate channels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot/user token for the Web API.
    pub api_token: String,
    /// Conversation for Web API posts.
    pub channel: String,
    /// Incoming-webhook URL.
    pub webhook_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            channel: DEFAULT_SLACK_CHANNEL.to_string(),
            webhook_url: String::new(),
        }
    }
}

impl SlackConfig {
    pub fn api_configured(&self) -> bool {
        !self.api_token.is_empty()
    }

    pub fn webhook_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Web API
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts through `chat.postMessage`. Messages get a timestamp suffix.
pub struct SlackChannel {
    api_token: String,
    channel: String,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(config: &SlackConfig, client: reqwest::Client) -> Self {
        let channel = if config.channel.is_empty() {
            DEFAULT_SLACK_CHANNEL.to_string()
        } else {
            config.channel.clone()
        };
        Self {
            api_token: config.api_token.clone(),
            channel,
            client,
        }
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        serde_json::json!({ "channel": self.channel, "text": text })
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.api_token)
            .json(&self.payload(&with_timestamp(message)))
            .send()
            .await?;

        // The Web API reports most failures as HTTP 200 with `ok: false`.
        let parsed: PostMessageResponse = ensure_success(response).await?.json().await?;
        if !parsed.ok {
            return Err(DeliveryError::Rejected(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Incoming webhook
// ---------------------------------------------------------------------------

/// Posts `{ "text": message }` to an incoming-webhook URL.
pub struct SlackWebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl SlackWebhookChannel {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl AlertChannel for SlackWebhookChannel {
    fn name(&self) -> &'static str {
        "slack_webhook"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::http_client;

    #[test]
    fn empty_channel_falls_back_to_default() {
        let cfg = SlackConfig {
            api_token: "xoxb-1".to_string(),
            channel: String::new(),
            webhook_url: String::new(),
        };
        let ch = SlackChannel::new(&cfg, http_client());
        assert_eq!(ch.payload("hi")["channel"], "#random");
    }

    #[test]
    fn api_and_webhook_enable_independently() {
        let cfg = SlackConfig {
            webhook_url: "https://hooks.slack.com/services/T/B/X".to_string(),
            ..Default::default()
        };
        assert!(!cfg.api_configured());
        assert!(cfg.webhook_configured());
    }

    #[test]
    fn rejected_response_parses_error() {
        let parsed: PostMessageResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error.as_deref(), Some("channel_not_found"));
    }
}
