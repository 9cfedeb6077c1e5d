//! Raw sensor readings delivered by a signal source.

use serde::Deserialize;
use tokio::time::Instant;

/// How the sensor is wired and therefore which edges the signal source
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Only rising edges are reported. Assertion is inferred to last for the
    /// pulse timeout after the most recent pulse.
    #[default]
    Pulse,
    /// Both edges are reported, each carrying the current pin level.
    Level,
}

impl SignalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pulse => "pulse",
            Self::Level => "level",
        }
    }
}

impl std::fmt::Display for SignalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sensor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignalEvent {
    /// When the edge was observed.
    pub timestamp: Instant,
    /// Pin level after the edge. Always `true` in pulse mode.
    pub asserted: bool,
}

impl RawSignalEvent {
    /// A rising edge / pulse at `timestamp`.
    pub fn asserted_at(timestamp: Instant) -> Self {
        Self {
            timestamp,
            asserted: true,
        }
    }

    /// A falling edge at `timestamp` (level mode only).
    pub fn released_at(timestamp: Instant) -> Self {
        Self {
            timestamp,
            asserted: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        mode: SignalMode,
    }

    #[test]
    fn mode_defaults_to_pulse() {
        assert_eq!(SignalMode::default(), SignalMode::Pulse);
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let w: Wrapper = toml::from_str(r#"mode = "level""#).expect("valid mode");
        assert_eq!(w.mode, SignalMode::Level);

        let bad: Result<Wrapper, _> = toml::from_str(r#"mode = "edge""#);
        assert!(bad.is_err());
    }

    #[test]
    fn constructors_set_level() {
        let now = Instant::now();
        assert!(RawSignalEvent::asserted_at(now).asserted);
        assert!(!RawSignalEvent::released_at(now).asserted);
    }
}
