//! Hysteresis engine that turns raw sensor edges into appliance activity.
//!
//! [`ActivityDetector`] keeps a debounced view of the sensor and flips the
//! modeled "appliance active" flag only after the sensor has been asserted
//! for longer than the onset delay, or quiet for longer than the decay delay.
//!
//! ```text
//!              asserted for > onset_delay
//!   Inactive ─────────────────────────────► Active
//!      ▲                                      │
//!      └──────────────────────────────────────┘
//!              quiet for > decay_delay
//! ```
//!
//! Signals only update state. Decisions are made exclusively in
//! [`ActivityDetector::on_tick`], so elapsed-time thresholds are measured
//! at a fixed cadence regardless of how bursty the sensor is.
//!
//! Pure logic: no clocks are read here. The caller supplies every instant.

use std::time::Duration;

use tokio::time::Instant;

use crate::signal::{RawSignalEvent, SignalMode};

/// How long a pulse keeps the sensor asserted when no further pulse arrives.
pub const DEFAULT_PULSE_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Immutable thresholds for an [`ActivityDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    /// Which edges the signal source reports.
    pub mode: SignalMode,
    /// Sustained assertion required before the appliance is declared active.
    pub onset_delay: Duration,
    /// Sustained quiet required before the appliance is declared inactive.
    pub decay_delay: Duration,
    /// Pulse mode only: how long a single pulse holds the sensor asserted.
    pub pulse_timeout: Duration,
}

impl DetectorSettings {
    /// Settings with the default pulse timeout.
    pub fn new(mode: SignalMode, onset_delay: Duration, decay_delay: Duration) -> Self {
        Self {
            mode,
            onset_delay,
            decay_delay,
            pulse_timeout: DEFAULT_PULSE_TIMEOUT,
        }
    }

    pub fn with_pulse_timeout(mut self, pulse_timeout: Duration) -> Self {
        self.pulse_timeout = pulse_timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// ActivityTransition
// ---------------------------------------------------------------------------

/// A change of the modeled appliance state, emitted by
/// [`ActivityDetector::on_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTransition {
    /// `true` when the appliance started, `false` when it stopped.
    pub became_active: bool,
    /// The tick instant at which the rule fired.
    pub at: Instant,
}

impl ActivityTransition {
    pub fn started(at: Instant) -> Self {
        Self {
            became_active: true,
            at,
        }
    }

    pub fn stopped(at: Instant) -> Self {
        Self {
            became_active: false,
            at,
        }
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        if self.became_active {
            "started"
        } else {
            "stopped"
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityDetector
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DetectorState {
    /// Debounced sensor assertion, recomputed on every tick.
    signal_asserted: bool,
    /// Most recent asserted reading. `None` until the first assertion.
    last_asserted_at: Option<Instant>,
    /// `last_asserted_at` was set by a level-mode tick rather than an edge.
    asserted_at_from_tick: bool,
    /// Start of the current unbroken run of assertions.
    assertion_started_at: Option<Instant>,
    /// Most recent tick that observed the sensor quiet.
    last_quiet_at: Option<Instant>,
    /// Last reported pin level (level mode).
    level: bool,
    /// The modeled appliance state.
    active: bool,
}

/// Stateful hysteresis detector.
///
/// Not internally synchronized: the owner must serialize calls to
/// [`on_signal`](Self::on_signal) and [`on_tick`](Self::on_tick).
#[derive(Debug)]
pub struct ActivityDetector {
    settings: DetectorSettings,
    state: DetectorState,
}

/// Elapsed time from `since` to `now`, clamped to zero for out-of-order input.
fn elapsed(now: Instant, since: Instant) -> Duration {
    now.saturating_duration_since(since)
}

impl ActivityDetector {
    /// Create a detector in the inactive, quiet state.
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            state: DetectorState::default(),
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Whether the appliance is currently considered running.
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Debounced sensor assertion as of the last tick or signal.
    pub fn is_signal_asserted(&self) -> bool {
        self.state.signal_asserted
    }

    pub fn last_asserted_at(&self) -> Option<Instant> {
        self.state.last_asserted_at
    }

    pub fn last_quiet_at(&self) -> Option<Instant> {
        self.state.last_quiet_at
    }

    /// Record a sensor edge.
    ///
    /// Updates timestamps only; never produces a transition.
    pub fn on_signal(&mut self, event: RawSignalEvent) {
        if event.asserted {
            let already_asserted = self.assertion_held_at(event.timestamp);
            self.record_assertion(event.timestamp);
            if self.settings.mode == SignalMode::Level {
                self.state.level = true;
            }
            if !already_asserted {
                self.state.assertion_started_at = Some(event.timestamp);
                self.state.signal_asserted = true;
            }
        } else if self.settings.mode == SignalMode::Level {
            // The sensor was asserted right up to the falling edge. A tick
            // that ran after the edge but before this event saw a stale
            // level, so the edge timestamp wins over it.
            self.state.level = false;
            if self.state.asserted_at_from_tick {
                self.state.last_asserted_at = Some(event.timestamp);
                self.state.asserted_at_from_tick = false;
            } else {
                self.record_assertion(event.timestamp);
            }
        }
    }

    /// Re-evaluate the detector at `now`.
    ///
    /// Applies at most one rule, onset before decay, and returns the
    /// transition it produced.
    pub fn on_tick(&mut self, now: Instant) -> Option<ActivityTransition> {
        let asserted = match self.settings.mode {
            SignalMode::Pulse => self
                .state
                .last_asserted_at
                .is_some_and(|last| elapsed(now, last) < self.settings.pulse_timeout),
            SignalMode::Level => {
                if self.state.level {
                    self.record_assertion(now);
                    self.state.asserted_at_from_tick = true;
                }
                self.state.level
            }
        };

        self.state.signal_asserted = asserted;
        if !asserted {
            self.state.last_quiet_at = Some(now);
            self.state.assertion_started_at = None;
        }

        if !self.state.active && asserted && self.onset_elapsed(now) {
            self.state.active = true;
            return Some(ActivityTransition::started(now));
        }

        if self.state.active && !asserted && self.decay_elapsed(now) {
            self.state.active = false;
            return Some(ActivityTransition::stopped(now));
        }

        None
    }

    /// Whether the current assertion run is still alive at `at`.
    fn assertion_held_at(&self, at: Instant) -> bool {
        if !self.state.signal_asserted {
            return false;
        }
        match self.settings.mode {
            SignalMode::Pulse => self
                .state
                .last_asserted_at
                .is_some_and(|last| elapsed(at, last) < self.settings.pulse_timeout),
            SignalMode::Level => true,
        }
    }

    /// Advance `last_asserted_at`, never moving it backwards.
    fn record_assertion(&mut self, at: Instant) {
        self.state.last_asserted_at = Some(match self.state.last_asserted_at {
            Some(last) if last > at => last,
            _ => at,
        });
        self.state.asserted_at_from_tick = false;
    }

    fn onset_elapsed(&self, now: Instant) -> bool {
        self.state
            .assertion_started_at
            .is_some_and(|start| elapsed(now, start) > self.settings.onset_delay)
    }

    fn decay_elapsed(&self, now: Instant) -> bool {
        self.state
            .last_asserted_at
            .is_some_and(|last| elapsed(now, last) > self.settings.decay_delay)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
