//! Pushover push notifications.
//!
//! A configured sound is only sent if Pushover lists it in its sound
//! catalogue; the catalogue is fetched lazily on first use and cached for
//! the process lifetime. If the lookup fails the alert is still sent, just
//! without a sound, and the lookup is retried on the next alert.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::channel::{AlertChannel, DeliveryError};
use crate::delivery::ensure_success;

const MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";
const SOUNDS_URL: &str = "https://api.pushover.net/1/sounds.json";

/// The `[pushover]` config block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushoverConfig {
    pub user_api_key: String,
    pub app_api_key: String,
    /// Optional target device name.
    pub device: String,
    /// Optional notification sound name.
    pub sound: String,
}

impl PushoverConfig {
    pub fn is_configured(&self) -> bool {
        !self.user_api_key.is_empty() && !self.app_api_key.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SoundsResponse {
    sounds: HashMap<String, String>,
}

pub struct PushoverChannel {
    config: PushoverConfig,
    client: reqwest::Client,
    sounds: OnceCell<HashSet<String>>,
}

impl PushoverChannel {
    pub fn new(config: PushoverConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            sounds: OnceCell::new(),
        }
    }

    /// JSON body for the messages endpoint.
    ///
    /// `known_sounds` is the provider catalogue, if it could be fetched.
    fn payload(&self, message: &str, known_sounds: Option<&HashSet<String>>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "user": self.config.user_api_key,
            "token": self.config.app_api_key,
            "message": message,
        });

        if !self.config.device.is_empty() {
            body["device"] = self.config.device.clone().into();
        }

        if known_sounds.is_some_and(|s| s.contains(&self.config.sound)) {
            body["sound"] = self.config.sound.clone().into();
        }

        body
    }

    async fn fetch_sounds(&self) -> Result<HashSet<String>, DeliveryError> {
        let response = self
            .client
            .get(SOUNDS_URL)
            .query(&[("token", self.config.app_api_key.as_str())])
            .send()
            .await?;
        let parsed: SoundsResponse = ensure_success(response).await?.json().await?;
        tracing::debug!(count = parsed.sounds.len(), "Fetched Pushover sound list");
        Ok(parsed.sounds.into_keys().collect())
    }

    async fn known_sounds(&self) -> Option<&HashSet<String>> {
        if self.config.sound.is_empty() {
            return None;
        }
        match self.sounds.get_or_try_init(|| self.fetch_sounds()).await {
            Ok(sounds) => Some(sounds),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch Pushover sounds, sending without sound");
                None
            }
        }
    }
}

#[async_trait]
impl AlertChannel for PushoverChannel {
    fn name(&self) -> &'static str {
        "pushover"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let sounds = self.known_sounds().await;
        let body = self.payload(message, sounds);
        let response = self.client.post(MESSAGES_URL).json(&body).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::http_client;

    fn channel(device: &str, sound: &str) -> PushoverChannel {
        PushoverChannel::new(
            PushoverConfig {
                user_api_key: "user".to_string(),
                app_api_key: "app".to_string(),
                device: device.to_string(),
                sound: sound.to_string(),
            },
            http_client(),
        )
    }

    #[test]
    fn requires_both_keys() {
        let mut cfg = PushoverConfig {
            user_api_key: "user".to_string(),
            ..Default::default()
        };
        assert!(!cfg.is_configured());
        cfg.app_api_key = "app".to_string();
        assert!(cfg.is_configured());
    }

    #[test]
    fn payload_omits_empty_device_and_unknown_sound() {
        let body = channel("", "").payload("Washer done", None);
        assert_eq!(body["user"], "user");
        assert_eq!(body["token"], "app");
        assert_eq!(body["message"], "Washer done");
        assert!(body.get("device").is_none());
        assert!(body.get("sound").is_none());
    }

    #[test]
    fn payload_includes_device_and_known_sound() {
        let sounds: HashSet<String> = ["cashregister".to_string()].into_iter().collect();
        let body = channel("phone", "cashregister").payload("Washer done", Some(&sounds));
        assert_eq!(body["device"], "phone");
        assert_eq!(body["sound"], "cashregister");
    }

    #[test]
    fn payload_drops_sound_missing_from_catalogue() {
        let sounds: HashSet<String> = ["pushover".to_string()].into_iter().collect();
        let body = channel("", "kazoo").payload("Washer done", Some(&sounds));
        assert!(body.get("sound").is_none());
    }

    #[tokio::test]
    async fn no_sound_configured_skips_catalogue_lookup() {
        let ch = channel("", "");
        assert!(ch.known_sounds().await.is_none());
        assert!(!ch.sounds.initialized());
    }
}
