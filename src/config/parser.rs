//! INI parsing logic for converting `Ini` → `Settings`.
//!
//! Starts from `Settings::default()` and overlays any values found in the
//! file. This is the single place where INI key names are mapped to struct
//! fields, and the single place that rejects inconsistent values.

use std::time::Duration;

use ini::Ini;

use super::settings::Settings;
use super::ConfigError;

pub(super) fn parse_ini(ini: &Ini) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(section) = ini.section(Some("gpsd")) {
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if !v.is_empty() {
                settings.gpsd.host = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            settings.gpsd.port = parse_port("gpsd", "port", v)?;
        }
        if let Some(v) = section.get("timeout") {
            settings.gpsd.timeout = parse_interval("gpsd", "timeout", v)?;
        }
        if let Some(v) = section.get("stale_after") {
            settings.gpsd.stale_after = parse_interval("gpsd", "stale_after", v)?;
        }
    }

    if let Some(section) = ini.section(Some("policy")) {
        if let Some(v) = section.get("always_interval") {
            settings.policy.always_interval = parse_interval("policy", "always_interval", v)?;
        }
        if let Some(v) = section.get("move_interval") {
            settings.policy.move_interval = parse_interval("policy", "move_interval", v)?;
        }
        if let Some(v) = section.get("track_interval") {
            settings.policy.track_interval = parse_interval("policy", "track_interval", v)?;
        }
        if let Some(v) = section.get("sky_min_interval") {
            settings.policy.sky_min_interval = parse_interval("policy", "sky_min_interval", v)?;
        }
        if let Some(v) = section.get("move_distance") {
            settings.policy.move_distance_km = parse_threshold("policy", "move_distance", v)?;
        }
        if let Some(v) = section.get("track_change") {
            settings.policy.track_change_deg = parse_threshold("policy", "track_change", v)?;
        }
        if let Some(v) = section.get("speed_change") {
            settings.policy.speed_change_kmh = parse_threshold("policy", "speed_change", v)?;
        }
        if let Some(v) = section.get("min_speed") {
            settings.policy.min_speed_kmh = parse_threshold("policy", "min_speed", v)?;
        }
    }

    if let Some(section) = ini.section(Some("mqtt")) {
        if let Some(v) = section.get("enabled") {
            settings.mqtt.enabled = parse_bool("mqtt", "enabled", v)?;
        }
        if let Some(v) = section.get("broker") {
            let v = v.trim();
            if !v.is_empty() {
                settings.mqtt.broker = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            settings.mqtt.port = parse_port("mqtt", "port", v)?;
        }
        if let Some(v) = section.get("username") {
            let v = v.trim();
            if !v.is_empty() {
                settings.mqtt.username = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("password") {
            let v = v.trim();
            if !v.is_empty() {
                settings.mqtt.password = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("topic_prefix") {
            let v = v.trim().trim_end_matches('/');
            if !v.is_empty() {
                settings.mqtt.topic_prefix = v.to_string();
            }
        }
        if let Some(v) = section.get("retain") {
            settings.mqtt.retain = parse_bool("mqtt", "retain", v)?;
        }
    }

    if let Some(section) = ini.section(Some("traccar")) {
        if let Some(v) = section.get("enabled") {
            settings.traccar.enabled = parse_bool("traccar", "enabled", v)?;
        }
        if let Some(v) = section.get("url") {
            let v = v.trim().trim_end_matches('/');
            if !v.is_empty() {
                settings.traccar.url = v.to_string();
            }
        }
        if let Some(v) = section.get("id") {
            let v = v.trim();
            if !v.is_empty() {
                settings.traccar.id = v.to_string();
            }
        }
    }

    Ok(settings)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a whole-second interval. Zero is allowed (disables the rule).
fn parse_interval(section: &str, key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid(section, key, value, "expected a whole number of seconds"))
}

/// Parse a non-negative physical threshold. Zero disables the rule.
fn parse_threshold(section: &str, key: &str, value: &str) -> Result<f64, ConfigError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(section, key, value, "expected a number"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid(section, key, value, "must be zero or positive"));
    }
    Ok(parsed)
}

fn parse_port(section: &str, key: &str, value: &str) -> Result<u16, ConfigError> {
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| invalid(section, key, value, "expected a port number (1-65535)"))?;
    if port == 0 {
        return Err(invalid(section, key, value, "port 0 is not usable"));
    }
    Ok(port)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "expected true/false, yes/no, 1/0, or on/off")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_ini_spellings() {
        assert!(parse_bool("s", "k", "Yes").unwrap());
        assert!(parse_bool("s", "k", "1").unwrap());
        assert!(!parse_bool("s", "k", "off").unwrap());
        assert!(parse_bool("s", "k", "maybe").is_err());
    }

    #[test]
    fn test_parse_interval_zero_allowed() {
        assert_eq!(parse_interval("s", "k", "0").unwrap(), Duration::ZERO);
        assert!(parse_interval("s", "k", "-5").is_err());
        assert!(parse_interval("s", "k", "2.5").is_err());
    }

    #[test]
    fn test_parse_threshold_rejects_negative_and_nan() {
        assert!(parse_threshold("s", "k", "-0.1").is_err());
        assert!(parse_threshold("s", "k", "NaN").is_err());
        assert_eq!(parse_threshold("s", "k", "0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_port_rejects_zero() {
        assert!(parse_port("s", "k", "0").is_err());
        assert_eq!(parse_port("s", "k", "2947").unwrap(), 2947);
    }
}
