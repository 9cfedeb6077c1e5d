//! Appliance activity detection.
//!
//! Pure domain logic with no I/O:
//!
//! - [`signal`]: raw sensor edges and the wiring mode.
//! - [`activity`]: the hysteresis detector that infers appliance activity.
//! - [`messages`]: alert text for each transition kind.

pub mod activity;
pub mod messages;
pub mod signal;

pub use activity::{ActivityDetector, ActivityTransition, DetectorSettings, DEFAULT_PULSE_TIMEOUT};
pub use messages::Messages;
pub use signal::{RawSignalEvent, SignalMode};
