//! Periodic re-evaluation of the activity detector.
//!
//! One task owns the [`ActivityDetector`] and serializes signal delivery and
//! heartbeat ticks through `tokio::select!`. Ticks keep running when the
//! sensor falls silent, which is what lets the decay transition fire.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vibration_core::{ActivityDetector, ActivityTransition, Messages, RawSignalEvent};
use vibration_events::NotificationDispatcher;

// ---------------------------------------------------------------------------
// TransitionSink
// ---------------------------------------------------------------------------

/// Receives the transitions produced by the heartbeat loop.
///
/// Called from inside the loop, so implementations must not block.
pub trait TransitionSink: Send {
    fn on_transition(&mut self, transition: ActivityTransition);
}

/// Maps transitions to the configured text and fans them out on a
/// background task.
pub struct AlertSink {
    dispatcher: Arc<NotificationDispatcher>,
    messages: Messages,
}

impl AlertSink {
    pub fn new(dispatcher: Arc<NotificationDispatcher>, messages: Messages) -> Self {
        Self {
            dispatcher,
            messages,
        }
    }
}

impl TransitionSink for AlertSink {
    fn on_transition(&mut self, transition: ActivityTransition) {
        let message = self.messages.for_transition(&transition);
        tracing::info!(transition = transition.kind(), text = message, "Alerting");
        // Fire and forget: outcomes are logged by the dispatcher.
        drop(self.dispatcher.spawn_dispatch(message));
    }
}

// ---------------------------------------------------------------------------
// HeartbeatScheduler
// ---------------------------------------------------------------------------

pub struct HeartbeatScheduler {
    interval: Duration,
}

impl HeartbeatScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `cancel` fires.
    ///
    /// The first tick happens one interval after the call. Ticks that fall
    /// behind are skipped rather than bunched up. Pending signals are always
    /// drained before a tick is evaluated. A closed signal channel is logged
    /// once and ticking carries on.
    pub async fn run<S: TransitionSink>(
        &self,
        detector: &mut ActivityDetector,
        signals: &mut mpsc::UnboundedReceiver<RawSignalEvent>,
        sink: &mut S,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut signals_open = true;

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            mode = %detector.settings().mode,
            "Heartbeat scheduler started"
        );

        loop {
            tokio::select! {
                // Queued edges are applied before a tick, so a tick never
                // evaluates a level the sensor has already left.
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("Heartbeat scheduler shutting down");
                    break;
                }
                event = signals.recv(), if signals_open => match event {
                    Some(event) => {
                        tracing::trace!(asserted = event.asserted, "Sensor signal");
                        detector.on_signal(event);
                    }
                    None => {
                        tracing::warn!("Signal source closed, continuing on heartbeat only");
                        signals_open = false;
                    }
                },
                _ = ticker.tick() => {
                    let transition = detector.on_tick(Instant::now());
                    tracing::debug!(
                        active = detector.is_active(),
                        asserted = detector.is_signal_asserted(),
                        "Heartbeat"
                    );
                    if let Some(transition) = transition {
                        sink.on_transition(transition);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use vibration_core::{DetectorSettings, SignalMode};

    use super::*;

    #[derive(Default)]
    struct Collect(Vec<ActivityTransition>);

    impl TransitionSink for Collect {
        fn on_transition(&mut self, transition: ActivityTransition) {
            self.0.push(transition);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let scheduler = HeartbeatScheduler::new(Duration::from_secs(1));
        let mut detector = ActivityDetector::new(DetectorSettings::new(
            SignalMode::Pulse,
            Duration::from_secs(5),
            Duration::from_secs(10),
        ));
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = Collect::default();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        scheduler.run(&mut detector, &mut rx, &mut sink, cancel).await;

        assert!(sink.0.is_empty());
        assert!(!detector.is_active());
    }
}
