//! `vibration-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod channels;
pub mod config;
pub mod heartbeat;
pub mod signal_source;
