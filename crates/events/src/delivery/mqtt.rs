//! One-shot MQTT publish.
//!
//! Each alert opens a fresh connection, publishes once at QoS 0 without the
//! retain flag, and disconnects. Alerts are rare, so a long-lived session
//! is not worth keeping open.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, QoS};
use serde::Deserialize;

use crate::channel::{AlertChannel, DeliveryError};

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "vibration-monitor";
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Request channel capacity between the client handle and its event loop.
const CLIENT_CAPACITY: usize = 10;

/// The `[mqtt]` config block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub hostname: String,
    pub port: u16,
    /// Topic to publish to. Empty disables the channel.
    pub topic: String,
    /// Optional; credentials are only sent when non-empty.
    pub username: String,
    pub password: String,
    pub client_id: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_MQTT_PORT,
            topic: String::new(),
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
        }
    }
}

impl MqttConfig {
    pub fn is_configured(&self) -> bool {
        !self.topic.is_empty()
    }

    fn options(&self) -> MqttOptions {
        let client_id = if self.client_id.is_empty() {
            DEFAULT_CLIENT_ID
        } else {
            self.client_id.as_str()
        };
        let mut options = MqttOptions::new(client_id, &self.hostname, self.port);
        options.set_keep_alive(KEEP_ALIVE);
        if !self.username.is_empty() {
            options.set_credentials(&self.username, &self.password);
        }
        options
    }
}

pub struct MqttChannel {
    config: MqttConfig,
}

impl MqttChannel {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }
}

/// Poll the event loop until `done` matches an outgoing packet.
async fn drive_until(
    eventloop: &mut EventLoop,
    done: impl Fn(&Outgoing) -> bool,
) -> Result<(), DeliveryError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(packet)) if done(&packet) => return Ok(()),
            Ok(event) => tracing::trace!(?event, "MQTT event"),
            Err(e) => return Err(DeliveryError::Mqtt(e.to_string())),
        }
    }
}

#[async_trait]
impl AlertChannel for MqttChannel {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let (client, mut eventloop) = AsyncClient::new(self.config.options(), CLIENT_CAPACITY);

        client
            .publish(
                self.config.topic.clone(),
                QoS::AtMostOnce,
                false,
                message.as_bytes().to_vec(),
            )
            .await
            .map_err(|e| DeliveryError::Mqtt(e.to_string()))?;
        drive_until(&mut eventloop, |p| matches!(p, Outgoing::Publish(_))).await?;

        client
            .disconnect()
            .await
            .map_err(|e| DeliveryError::Mqtt(e.to_string()))?;
        // The publish is already on the wire; a failed disconnect is harmless.
        if let Err(e) = drive_until(&mut eventloop, |p| matches!(p, Outgoing::Disconnect)).await {
            tracing::debug!(error = %e, "MQTT disconnect did not complete cleanly");
        }

        tracing::debug!(topic = %self.config.topic, "MQTT alert published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_disabled_with_standard_port() {
        let cfg = MqttConfig::default();
        assert!(!cfg.is_configured());
        assert_eq!(cfg.port, 1883);
    }

    #[test]
    fn options_fall_back_to_default_client_id() {
        let cfg = MqttConfig {
            topic: "home/laundry".to_string(),
            ..Default::default()
        };
        let options = cfg.options();
        assert_eq!(options.client_id(), DEFAULT_CLIENT_ID);
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
        assert_eq!(options.keep_alive(), KEEP_ALIVE);
    }

    #[test]
    fn options_use_configured_client_id() {
        let cfg = MqttConfig {
            topic: "home/laundry".to_string(),
            username: "pi".to_string(),
            password: "hunter2".to_string(),
            client_id: "washer".to_string(),
            ..Default::default()
        };
        let options = cfg.options();
        assert_eq!(options.client_id(), "washer");
    }
}
