//! Build the enabled alert channels from configuration.

use vibration_events::delivery::http_client;
use vibration_events::{
    AlertChannel, EmailChannel, MqttChannel, PushbulletChannel, PushoverChannel, SlackChannel,
    SlackWebhookChannel, TwitterChannel, WebhookChannel,
};

use crate::config::AppConfig;

/// One channel per provider whose credentials are present. Providers with
/// missing credentials are skipped. All HTTP channels share one client.
pub fn build_channels(config: &AppConfig) -> Vec<Box<dyn AlertChannel>> {
    let client = http_client();
    let mut channels: Vec<Box<dyn AlertChannel>> = Vec::new();

    if config.pushover.is_configured() {
        channels.push(Box::new(PushoverChannel::new(
            config.pushover.clone(),
            client.clone(),
        )));
    }
    for (name, key) in config.pushbullet.configured_keys() {
        channels.push(Box::new(PushbulletChannel::new(name, key, client.clone())));
    }
    if config.twitter.is_configured() {
        channels.push(Box::new(TwitterChannel::new(
            config.twitter.clone(),
            client.clone(),
        )));
    }
    if config.slack.api_configured() {
        channels.push(Box::new(SlackChannel::new(&config.slack, client.clone())));
    }
    if config.slack.webhook_configured() {
        channels.push(Box::new(SlackWebhookChannel::new(
            config.slack.webhook_url.clone(),
            client.clone(),
        )));
    }
    if config.ifttt.is_configured() {
        channels.push(Box::new(WebhookChannel::ifttt(&config.ifttt, client.clone())));
    }
    if config.webhook.is_configured() {
        channels.push(Box::new(WebhookChannel::generic(&config.webhook, client)));
    }
    if config.mqtt.is_configured() {
        channels.push(Box::new(MqttChannel::new(config.mqtt.clone())));
    }
    if config.email.is_configured() {
        channels.push(Box::new(EmailChannel::new(config.email.clone())));
    }

    for channel in &channels {
        tracing::debug!(channel = channel.name(), "Alert channel enabled");
    }
    channels
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
