//! Pushbullet "note" pushes.
//!
//! Two independent access tokens may be configured (`api_key` and
//! `api_key2`); each becomes its own channel so one account failing does not
//! affect the other.

use async_trait::async_trait;
use serde::Deserialize;

use crate::channel::{AlertChannel, DeliveryError};
use crate::delivery::ensure_success;

const PUSHES_URL: &str = "https://api.pushbullet.com/v2/pushes";

/// The `[pushbullet]` config block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushbulletConfig {
    pub api_key: String,
    pub api_key2: String,
}

impl PushbulletConfig {
    /// `(channel name, token)` for every non-empty key slot.
    pub fn configured_keys(&self) -> Vec<(&'static str, &str)> {
        [("pushbullet", &self.api_key), ("pushbullet2", &self.api_key2)]
            .into_iter()
            .filter(|(_, key)| !key.is_empty())
            .map(|(name, key)| (name, key.as_str()))
            .collect()
    }
}

pub struct PushbulletChannel {
    name: &'static str,
    api_key: String,
    client: reqwest::Client,
}

impl PushbulletChannel {
    pub fn new(name: &'static str, api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name,
            api_key: api_key.into(),
            client,
        }
    }
}

fn payload(message: &str) -> serde_json::Value {
    serde_json::json!({ "type": "note", "body": message })
}

#[async_trait]
impl AlertChannel for PushbulletChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(PUSHES_URL)
            .bearer_auth(&self.api_key)
            .json(&payload(message))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_key_slot_is_independent() {
        let cfg = PushbulletConfig {
            api_key: String::new(),
            api_key2: "second".to_string(),
        };
        assert_eq!(cfg.configured_keys(), vec![("pushbullet2", "second")]);

        let cfg = PushbulletConfig {
            api_key: "first".to_string(),
            api_key2: "second".to_string(),
        };
        assert_eq!(cfg.configured_keys().len(), 2);
        assert!(PushbulletConfig::default().configured_keys().is_empty());
    }

    #[test]
    fn payload_is_a_note() {
        let body = payload("Dryer done");
        assert_eq!(body["type"], "note");
        assert_eq!(body["body"], "Dryer done");
    }
}
