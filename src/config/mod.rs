//! Configuration handling for ~/.gpsbridge/config.ini.
//!
//! Settings structs live in [`settings`], default values in [`defaults`],
//! and the INI-to-struct mapping in [`parser`]. Loading starts from
//! defaults and overlays whatever the file provides; an invalid value is a
//! hard error so the bridge never starts streaming with an inconsistent
//! policy.

mod defaults;
mod parser;
mod settings;

pub use defaults::*;
pub use settings::*;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Configuration errors. All fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the INI file.
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// A value failed validation.
    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl Settings {
    /// Load configuration from the default path (~/.gpsbridge/config.ini).
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields defaults; an unreadable or invalid file is an
    /// error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parser::parse_ini(&ini)
    }
}

/// Path to the config directory (~/.gpsbridge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gpsbridge")
}

/// Path to the config file (~/.gpsbridge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("missing.ini")).unwrap();

        assert_eq!(settings.gpsd.host, "127.0.0.1");
        assert_eq!(settings.gpsd.port, 2947);
        assert_eq!(settings.policy.always_interval, Duration::from_secs(60));
        assert!(settings.mqtt.enabled);
        assert!(!settings.traccar.enabled);
    }

    #[test]
    fn test_load_overlays_values() {
        let (_dir, path) = write_config(
            "[gpsd]\nhost = gps.local\nport = 12947\ntimeout = 3\nstale_after = 45\n\
             [policy]\nalways_interval = 120\nmin_speed = 3\n\
             [mqtt]\nenabled = false\n\
             [traccar]\nenabled = true\nurl = https://t.example:5055\nid = rover1\n",
        );

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.gpsd.host, "gps.local");
        assert_eq!(settings.gpsd.port, 12947);
        assert_eq!(settings.gpsd.timeout, Duration::from_secs(3));
        assert_eq!(settings.gpsd.stale_after, Duration::from_secs(45));
        assert_eq!(settings.policy.always_interval, Duration::from_secs(120));
        assert!((settings.policy.min_speed_kmh - 3.0).abs() < 1e-9);
        assert!(!settings.mqtt.enabled);
        assert!(settings.traccar.enabled);
        assert_eq!(settings.traccar.url, "https://t.example:5055");
        assert_eq!(settings.traccar.id, "rover1");
    }

    #[test]
    fn test_invalid_number_is_fatal() {
        let (_dir, path) = write_config("[policy]\nalways_interval = sixty\n");

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        let message = err.to_string();
        assert!(message.contains("policy.always_interval"), "{message}");
    }

    #[test]
    fn test_invalid_bool_is_fatal() {
        let (_dir, path) = write_config("[mqtt]\nenabled = maybe\n");

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_negative_threshold_is_fatal() {
        let (_dir, path) = write_config("[policy]\nmove_distance = -1\n");

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_policy_conversion_to_si() {
        let (_dir, path) = write_config("[policy]\nspeed_change = 18\nmin_speed = 3.6\n");

        let settings = Settings::load_from(&path).unwrap();
        let policy = settings.policy.to_report_policy();
        assert!((policy.speed_change - 5.0).abs() < 1e-9);
        assert!((policy.min_speed - 1.0).abs() < 1e-9);
    }
}
