//! Default configuration values.
//!
//! Centralized so the settings structs and the documentation stay in
//! agreement. Intervals are seconds, distances kilometers, speeds km/h;
//! the policy layer converts speeds to SI on load.

/// Default gpsd host.
pub const DEFAULT_GPSD_HOST: &str = "127.0.0.1";

/// Default gpsd port.
pub const DEFAULT_GPSD_PORT: u16 = 2947;

/// Default consumer dequeue wait, seconds.
pub const DEFAULT_GPSD_TIMEOUT_SECS: u64 = 5;

/// Default producer inactivity window, seconds.
pub const DEFAULT_GPSD_STALE_AFTER_SECS: u64 = 30;

/// Default unconditional heartbeat interval, seconds.
pub const DEFAULT_ALWAYS_INTERVAL_SECS: u64 = 60;

/// Default movement report interval, seconds.
pub const DEFAULT_MOVE_INTERVAL_SECS: u64 = 10;

/// Default turn report interval, seconds.
pub const DEFAULT_TRACK_INTERVAL_SECS: u64 = 2;

/// Default minimum interval between satellite-count reports, seconds.
/// Zero: every change reports.
pub const DEFAULT_SKY_MIN_INTERVAL_SECS: u64 = 0;

/// Default movement detection distance, kilometers (10 m).
pub const DEFAULT_MOVE_DISTANCE_KM: f64 = 0.01;

/// Default track change threshold, degrees.
pub const DEFAULT_TRACK_CHANGE_DEG: f64 = 5.0;

/// Default immediate-report speed change, km/h.
pub const DEFAULT_SPEED_CHANGE_KMH: f64 = 10.0;

/// Default jitter floor, km/h. Below this, reported speed is zero.
pub const DEFAULT_MIN_SPEED_KMH: f64 = 2.0;

/// Default MQTT broker host.
pub const DEFAULT_MQTT_BROKER: &str = "localhost";

/// Default MQTT port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default MQTT topic prefix.
pub const DEFAULT_MQTT_TOPIC_PREFIX: &str = "gps";

/// Default Traccar server URL (OsmAnd protocol port).
pub const DEFAULT_TRACCAR_URL: &str = "http://localhost:5055";

/// Default Traccar device identifier.
pub const DEFAULT_TRACCAR_ID: &str = "gpsbridge";
