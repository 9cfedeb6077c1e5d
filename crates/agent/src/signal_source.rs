//! Sensor input.
//!
//! The GPIO callback runs on the hardware library's interrupt thread and
//! only forwards a [`RawSignalEvent`] into a tokio channel. Everything else
//! happens on the heartbeat task.

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use vibration_core::{RawSignalEvent, SignalMode};

/// Translate one edge into the event the detector expects.
///
/// Pulse mode only reports rising edges; a falling edge there carries no
/// information and is dropped.
pub fn signal_for_edge(mode: SignalMode, rising: bool, at: Instant) -> Option<RawSignalEvent> {
    match (mode, rising) {
        (_, true) => Some(RawSignalEvent::asserted_at(at)),
        (SignalMode::Level, false) => Some(RawSignalEvent::released_at(at)),
        (SignalMode::Pulse, false) => None,
    }
}

/// Hand `signal` to the heartbeat task. Returns `false` once the receiver
/// is gone.
pub fn forward(events: &UnboundedSender<RawSignalEvent>, signal: RawSignalEvent) -> bool {
    match events.send(signal) {
        Ok(()) => true,
        Err(_) => {
            tracing::trace!(asserted = signal.asserted, "Signal receiver dropped, signal discarded");
            false
        }
    }
}

#[cfg(feature = "gpio")]
pub use gpio::{GpioSignalSource, SignalError};

#[cfg(feature = "gpio")]
mod gpio {
    use rppal::gpio::{Event, Gpio, InputPin, Trigger};
    use tokio::sync::mpsc::UnboundedSender;
    use tokio::time::Instant;
    use vibration_core::{RawSignalEvent, SignalMode};

    use super::{forward, signal_for_edge};

    #[derive(Debug, thiserror::Error)]
    pub enum SignalError {
        #[error("GPIO error: {0}")]
        Gpio(#[from] rppal::gpio::Error),
    }

    /// A pulled-down input pin with an async edge interrupt.
    ///
    /// The interrupt is active for as long as this value is alive.
    pub struct GpioSignalSource {
        pin: InputPin,
    }

    impl GpioSignalSource {
        pub fn start(
            pin_number: u8,
            mode: SignalMode,
            events: UnboundedSender<RawSignalEvent>,
        ) -> Result<Self, SignalError> {
            let mut pin = Gpio::new()?.get(pin_number)?.into_input_pulldown();

            let trigger = match mode {
                SignalMode::Pulse => Trigger::RisingEdge,
                SignalMode::Level => Trigger::Both,
            };

            // Level mode reports state, so the detector needs to know where
            // the pin starts.
            if mode == SignalMode::Level && pin.is_high() {
                forward(&events, RawSignalEvent::asserted_at(Instant::now()));
            }

            pin.set_async_interrupt(trigger, None, move |event: Event| {
                let rising = event.trigger == Trigger::RisingEdge;
                if let Some(signal) = signal_for_edge(mode, rising, Instant::now()) {
                    forward(&events, signal);
                }
            })?;

            tracing::info!(pin = pin_number, %mode, ?trigger, "GPIO sensor input ready");
            Ok(Self { pin })
        }

        pub fn pin(&self) -> u8 {
            self.pin.pin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_mode_keeps_rising_edges_only() {
        let now = Instant::now();
        assert_eq!(
            signal_for_edge(SignalMode::Pulse, true, now),
            Some(RawSignalEvent::asserted_at(now))
        );
        assert_eq!(signal_for_edge(SignalMode::Pulse, false, now), None);
    }

    #[test]
    fn level_mode_reports_both_directions() {
        let now = Instant::now();
        assert_eq!(
            signal_for_edge(SignalMode::Level, true, now),
            Some(RawSignalEvent::asserted_at(now))
        );
        assert_eq!(
            signal_for_edge(SignalMode::Level, false, now),
            Some(RawSignalEvent::released_at(now))
        );
    }

    #[test]
    fn forward_reports_delivery() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let signal = RawSignalEvent::asserted_at(Instant::now());
        assert!(forward(&tx, signal));
        assert_eq!(rx.try_recv().ok(), Some(signal));
    }

    #[test]
    fn forward_to_dropped_receiver_is_reported_not_panicking() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        assert!(!forward(&tx, RawSignalEvent::released_at(Instant::now())));
    }
}
