//! Alert delivery for the vibration monitor.
//!
//! - [`AlertChannel`]: the uniform contract every provider implements.
//! - [`NotificationDispatcher`]: fans one message out to every channel,
//!   isolating failures and bounding each call with a timeout.
//! - [`delivery`]: concrete channels (email, Pushover, Pushbullet,
//!   Twitter, Slack, IFTTT and generic webhooks, MQTT).

pub mod channel;
pub mod delivery;
pub mod dispatcher;

pub use channel::{AlertChannel, DeliveryError};
pub use delivery::email::{EmailChannel, EmailConfig, EmailError};
pub use delivery::mqtt::{MqttChannel, MqttConfig};
pub use delivery::pushbullet::{PushbulletChannel, PushbulletConfig};
pub use delivery::pushover::{PushoverChannel, PushoverConfig};
pub use delivery::slack::{SlackChannel, SlackConfig, SlackWebhookChannel};
pub use delivery::twitter::{TwitterChannel, TwitterConfig};
pub use delivery::webhook::{IftttConfig, WebhookChannel, WebhookConfig};
pub use dispatcher::{DeliveryReport, NotificationDispatcher, DEFAULT_SEND_TIMEOUT};
