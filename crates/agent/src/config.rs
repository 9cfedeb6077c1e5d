//! TOML configuration for the monitor daemon.
//!
//! Loaded once at startup and read-only afterwards. Only `[main]` is
//! required; every provider section may be omitted, which disables that
//! channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vibration_core::{DetectorSettings, Messages, SignalMode, DEFAULT_PULSE_TIMEOUT};
use vibration_events::{
    EmailConfig, IftttConfig, MqttConfig, PushbulletConfig, PushoverConfig, SlackConfig,
    TwitterConfig, WebhookConfig, DEFAULT_SEND_TIMEOUT,
};

const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// [main]
// ---------------------------------------------------------------------------

fn default_pulse_timeout_secs() -> u64 {
    DEFAULT_PULSE_TIMEOUT.as_secs()
}

fn default_heartbeat_interval_ms() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_MS
}

fn default_send_timeout_secs() -> u64 {
    DEFAULT_SEND_TIMEOUT.as_secs()
}

/// Sensor wiring, timing and alert texts.
#[derive(Debug, Clone, Deserialize)]
pub struct MainConfig {
    /// BCM GPIO number the sensor is wired to.
    pub sensor_pin: u8,
    #[serde(default)]
    pub mode: SignalMode,
    /// Continuous assertion required before the appliance counts as active.
    pub seconds_to_start: u64,
    /// Continuous quiet required before the appliance counts as inactive.
    pub seconds_to_end: u64,
    #[serde(default = "default_pulse_timeout_secs")]
    pub pulse_timeout_secs: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub boot_message: String,
    #[serde(default)]
    pub start_message: String,
    #[serde(default)]
    pub end_message: String,
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub main: MainConfig,
    #[serde(default)]
    pub pushbullet: PushbulletConfig,
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub ifttt: IftttConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let main = &self.main;
        if main.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_interval_ms must be greater than zero".into(),
            ));
        }
        if main.pulse_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "pulse_timeout_secs must be greater than zero".into(),
            ));
        }
        if main.send_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "send_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings::new(
            self.main.mode,
            Duration::from_secs(self.main.seconds_to_start),
            Duration::from_secs(self.main.seconds_to_end),
        )
        .with_pulse_timeout(Duration::from_secs(self.main.pulse_timeout_secs))
    }

    pub fn messages(&self) -> Messages {
        Messages {
            boot: self.main.boot_message.clone(),
            start: self.main.start_message.clone(),
            end: self.main.end_message.clone(),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.main.heartbeat_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.main.send_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const MINIMAL: &str = r#"
        [main]
        sensor_pin = 14
        seconds_to_start = 5
        seconds_to_end = 10
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.main.sensor_pin, 14);
        assert_eq!(config.main.mode, SignalMode::Pulse);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(config.send_timeout(), DEFAULT_SEND_TIMEOUT);
        assert!(!config.main.verbose);
        assert_eq!(config.messages(), Messages::default());
    }

    #[test]
    fn detector_settings_follow_main_section() {
        let raw = r#"
            [main]
            sensor_pin = 4
            mode = "level"
            seconds_to_start = 3
            seconds_to_end = 7
            pulse_timeout_secs = 4
        "#;
        let settings = AppConfig::from_toml_str(raw).unwrap().detector_settings();
        assert_eq!(settings.mode, SignalMode::Level);
        assert_eq!(settings.onset_delay, Duration::from_secs(3));
        assert_eq!(settings.decay_delay, Duration::from_secs(7));
        assert_eq!(settings.pulse_timeout, Duration::from_secs(4));
    }

    #[test]
    fn missing_main_section_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[pushover]\nuser_api_key = \"u\"").unwrap_err();
        assert_matches!(err, ConfigError::Parse(_));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let raw = MINIMAL.replace("sensor_pin = 14", "sensor_pin = 14\nmode = \"sideways\"");
        assert_matches!(AppConfig::from_toml_str(&raw), Err(ConfigError::Parse(_)));
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let raw = format!("{MINIMAL}\nheartbeat_interval_ms = 0\n");
        assert_matches!(AppConfig::from_toml_str(&raw), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_pulse_timeout_is_rejected() {
        let raw = format!("{MINIMAL}\npulse_timeout_secs = 0\n");
        assert_matches!(AppConfig::from_toml_str(&raw), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_send_timeout_is_rejected() {
        let raw = format!("{MINIMAL}\nsend_timeout_secs = 0\n");
        let err = AppConfig::from_toml_str(&raw).unwrap_err();
        assert_matches!(err, ConfigError::Invalid(ref msg) if msg.contains("send_timeout_secs"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load(Path::new("/nonexistent/vibration.toml")).unwrap_err();
        assert_matches!(err, ConfigError::Read { .. });
        assert!(err.to_string().contains("/nonexistent/vibration.toml"));
    }
}
