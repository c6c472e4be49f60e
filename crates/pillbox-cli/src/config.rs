//! Runtime configuration for the controller binary.
//!
//! Loaded from a JSON file when a path is given, otherwise every field
//! falls back to the built-in defaults (BCM pins 18/4/23/24, `pillbox.db`
//! next to the binary, simulated backend).

use anyhow::Context;
use pillbox_core::Pin;
use pillbox_core::constants::{
    DEFAULT_CLIMATE_PIN, DEFAULT_ECHO_PIN, DEFAULT_SERVO_PIN, DEFAULT_TRIGGER_PIN,
};
use serde::Deserialize;
use std::path::Path;

/// Hardware backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Simulated port, no physical I/O.
    Sim,

    /// Real GPIO pins (requires the `rpi` build feature).
    Rpi,
}

/// Controller configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PillboxConfig {
    /// Path to the SQLite schedule database.
    pub database_path: String,

    /// Which hardware backend to drive.
    pub backend: Backend,

    /// BCM pin for the servo PWM signal.
    pub servo_pin: u8,

    /// BCM pin for the DHT22 data line.
    pub climate_pin: u8,

    /// BCM pin for the ultrasonic trigger output.
    pub trigger_pin: u8,

    /// BCM pin for the ultrasonic echo input.
    pub echo_pin: u8,
}

impl Default for PillboxConfig {
    fn default() -> Self {
        Self {
            database_path: "pillbox.db".to_string(),
            backend: Backend::Sim,
            servo_pin: DEFAULT_SERVO_PIN,
            climate_pin: DEFAULT_CLIMATE_PIN,
            trigger_pin: DEFAULT_TRIGGER_PIN,
            echo_pin: DEFAULT_ECHO_PIN,
        }
    }
}

/// Validated pin assignments derived from a [`PillboxConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DevicePins {
    pub servo: Pin,
    pub climate: Pin,
    pub trigger: Pin,
    pub echo: Pin,
}

impl PillboxConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Load from a file when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configured pin numbers.
    pub fn pins(&self) -> anyhow::Result<DevicePins> {
        Ok(DevicePins {
            servo: Pin::new(self.servo_pin).context("servo_pin")?,
            climate: Pin::new(self.climate_pin).context("climate_pin")?,
            trigger: Pin::new(self.trigger_pin).context("trigger_pin")?,
            echo: Pin::new(self.echo_pin).context("echo_pin")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_wiring() {
        let config = PillboxConfig::default();
        assert_eq!(config.backend, Backend::Sim);
        assert_eq!(config.servo_pin, 18);
        assert_eq!(config.climate_pin, 4);
        assert_eq!(config.trigger_pin, 23);
        assert_eq!(config.echo_pin, 24);
        assert!(config.pins().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"backend": "rpi", "servo_pin": 12}}"#).unwrap();

        let config = PillboxConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, Backend::Rpi);
        assert_eq!(config.servo_pin, 12);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.echo_pin, 24);
        assert_eq!(config.database_path, "pillbox.db");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"servo": 12}}"#).unwrap();
        assert!(PillboxConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_out_of_range_pin_rejected() {
        let config = PillboxConfig {
            servo_pin: 40,
            ..Default::default()
        };
        assert!(config.pins().is_err());
    }
}
