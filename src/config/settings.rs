//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These are
//! pure data types; parsing lives in [`super::parser`].

use std::time::Duration;

use super::defaults::*;
use crate::policy::ReportPolicy;
use crate::units::kmh_to_mps;

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Position source settings.
    pub gpsd: GpsdSettings,
    /// Reporting policy thresholds.
    pub policy: PolicySettings,
    /// MQTT sink settings.
    pub mqtt: MqttSettings,
    /// Traccar sink settings.
    pub traccar: TraccarSettings,
}

/// `[gpsd]` section: where the position source lives and how patient the
/// pipeline is with it.
#[derive(Debug, Clone)]
pub struct GpsdSettings {
    pub host: String,
    pub port: u16,
    /// Consumer dequeue wait. A timeout here requests a session restart.
    pub timeout: Duration,
    /// Producer inactivity window. Silence beyond this tears the session
    /// down from the producer side.
    pub stale_after: Duration,
}

impl Default for GpsdSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_GPSD_HOST.to_string(),
            port: DEFAULT_GPSD_PORT,
            timeout: Duration::from_secs(DEFAULT_GPSD_TIMEOUT_SECS),
            stale_after: Duration::from_secs(DEFAULT_GPSD_STALE_AFTER_SECS),
        }
    }
}

/// `[policy]` section: significance thresholds as written in the file
/// (seconds, kilometers, degrees, km/h).
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub always_interval: Duration,
    pub move_interval: Duration,
    pub track_interval: Duration,
    pub sky_min_interval: Duration,
    pub move_distance_km: f64,
    pub track_change_deg: f64,
    pub speed_change_kmh: f64,
    pub min_speed_kmh: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            always_interval: Duration::from_secs(DEFAULT_ALWAYS_INTERVAL_SECS),
            move_interval: Duration::from_secs(DEFAULT_MOVE_INTERVAL_SECS),
            track_interval: Duration::from_secs(DEFAULT_TRACK_INTERVAL_SECS),
            sky_min_interval: Duration::from_secs(DEFAULT_SKY_MIN_INTERVAL_SECS),
            move_distance_km: DEFAULT_MOVE_DISTANCE_KM,
            track_change_deg: DEFAULT_TRACK_CHANGE_DEG,
            speed_change_kmh: DEFAULT_SPEED_CHANGE_KMH,
            min_speed_kmh: DEFAULT_MIN_SPEED_KMH,
        }
    }
}

impl PolicySettings {
    /// Convert to the engine's SI representation.
    pub fn to_report_policy(&self) -> ReportPolicy {
        ReportPolicy {
            always_interval: self.always_interval,
            move_interval: self.move_interval,
            track_interval: self.track_interval,
            sky_min_interval: self.sky_min_interval,
            move_distance_km: self.move_distance_km,
            track_change_deg: self.track_change_deg,
            speed_change: kmh_to_mps(self.speed_change_kmh),
            min_speed: kmh_to_mps(self.min_speed_kmh),
        }
    }
}

/// `[mqtt]` section.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub enabled: bool,
    pub broker: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
    pub retain: bool,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            broker: DEFAULT_MQTT_BROKER.to_string(),
            port: DEFAULT_MQTT_PORT,
            username: None,
            password: None,
            topic_prefix: DEFAULT_MQTT_TOPIC_PREFIX.to_string(),
            retain: true,
        }
    }
}

/// `[traccar]` section.
#[derive(Debug, Clone)]
pub struct TraccarSettings {
    pub enabled: bool,
    pub url: String,
    pub id: String,
}

impl Default for TraccarSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_TRACCAR_URL.to_string(),
            id: DEFAULT_TRACCAR_ID.to_string(),
        }
    }
}
