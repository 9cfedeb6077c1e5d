//! Failure-isolated fan-out of alert messages.
//!
//! [`NotificationDispatcher`] sends one message to every configured
//! [`AlertChannel`] concurrently. Each channel call runs on its own task and
//! is bounded by a timeout, and its outcome is reported separately. One
//! channel failing, hanging or panicking never affects the others and never
//! propagates to the caller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::channel::{AlertChannel, DeliveryError};

/// Upper bound on a single channel's `send` when none is configured.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// DeliveryReport
// ---------------------------------------------------------------------------

/// Outcome of one channel's delivery attempt.
#[derive(Debug)]
pub struct DeliveryReport {
    /// [`AlertChannel::name`] of the channel.
    pub channel: &'static str,
    pub outcome: Result<(), DeliveryError>,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Owns the configured channels for the lifetime of the process.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Box<dyn AlertChannel>>, send_timeout: Duration) -> Self {
        Self {
            channels: channels.into_iter().map(Arc::from).collect(),
            send_timeout,
        }
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send `message` to every channel and wait for all of them.
    ///
    /// An empty message is a no-op and invokes no channel. The message is
    /// passed to each channel unchanged.
    pub async fn dispatch(&self, message: &str) -> Vec<DeliveryReport> {
        if message.is_empty() {
            tracing::debug!("Empty alert message, nothing to dispatch");
            return Vec::new();
        }

        tracing::info!(text = message, channels = self.channels.len(), "Dispatching alert");

        let message: Arc<str> = Arc::from(message);
        let tasks = self.channels.iter().map(|channel| {
            let channel = Arc::clone(channel);
            let message = Arc::clone(&message);
            let send_timeout = self.send_timeout;
            tokio::spawn(async move { send_bounded(channel.as_ref(), &message, send_timeout).await })
        });
        let joined = join_all(tasks).await;

        let reports: Vec<DeliveryReport> = self
            .channels
            .iter()
            .zip(joined)
            .map(|(channel, joined)| {
                let outcome = joined.unwrap_or_else(|e| Err(DeliveryError::Panicked(e.to_string())));
                report(channel.name(), outcome)
            })
            .collect();

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            tracing::warn!(failed, total = reports.len(), "Some alert channels failed");
        }

        reports
    }

    /// Dispatch on a background task so the caller never waits on I/O.
    pub fn spawn_dispatch(self: &Arc<Self>, message: impl Into<String>) -> JoinHandle<Vec<DeliveryReport>> {
        let dispatcher = Arc::clone(self);
        let message = message.into();
        tokio::spawn(async move { dispatcher.dispatch(&message).await })
    }

}

/// One bounded attempt on a single channel.
async fn send_bounded(
    channel: &dyn AlertChannel,
    message: &str,
    send_timeout: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(send_timeout, channel.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(send_timeout)),
    }
}

fn report(name: &'static str, outcome: Result<(), DeliveryError>) -> DeliveryReport {
    match &outcome {
        Ok(()) => tracing::debug!(channel = name, "Alert delivered"),
        Err(e) => tracing::warn!(channel = name, error = %e, "Alert delivery failed"),
    }
    DeliveryReport {
        channel: name,
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
