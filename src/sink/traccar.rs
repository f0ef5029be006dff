//! Traccar tracking sink.
//!
//! Sends one HTTP GET per emitted Position sample using the OsmAnd
//! protocol: `{url}/?id={id}&timestamp={unix}&lat=...&lon=...`. Only fields
//! the sample actually carries appear in the query. Speed is reported in
//! km/h; `sendtime` (float seconds since the epoch) lets the receiving end
//! measure delivery lag.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use super::{SinkError, TrackingSink};
use crate::sample::Sample;
use crate::units::mps_to_kmh;

/// HTTP timeout for report delivery.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Traccar sink using direct HTTP requests.
///
/// Uses a reusable `reqwest::Client` with connection pooling and a
/// builder-set timeout.
pub struct TraccarSink {
    http: reqwest::Client,
    url: String,
    device_id: String,
}

impl TraccarSink {
    /// Create a sink posting to `url` (no trailing slash) as `device_id`.
    pub fn new(url: String, device_id: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            url,
            device_id,
        }
    }
}

impl TrackingSink for TraccarSink {
    async fn send_position(&self, sample: &Sample) -> Result<(), SinkError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let query = build_query(sample, &self.device_id, now);
        let url = format!("{}/?{}", self.url, query);

        debug!(url = %url, "sending traccar report");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

/// Build the OsmAnd-style query string for a sample.
///
/// `now` is the current Unix time; it provides both the whole-second
/// `timestamp` and the float `sendtime`.
fn build_query(sample: &Sample, device_id: &str, now: Duration) -> String {
    let mut query = format!("id={}&timestamp={}", device_id, now.as_secs());

    if let Some(lat) = sample.latitude {
        query.push_str(&format!("&lat={lat}"));
    }
    if let Some(lon) = sample.longitude {
        query.push_str(&format!("&lon={lon}"));
    }
    if let Some(alt) = sample.altitude {
        query.push_str(&format!("&altitude={alt}"));
    }
    if let Some(speed) = sample.speed {
        query.push_str(&format!("&speed={}", mps_to_kmh(speed)));
    }
    if let Some(track) = sample.track {
        query.push_str(&format!("&bearing={track}"));
    }
    if let Some(epx) = sample.epx {
        query.push_str(&format!("&epx={epx}"));
    }
    if let Some(epy) = sample.epy {
        query.push_str(&format!("&epy={epy}"));
    }
    if let Some(epv) = sample.epv {
        query.push_str(&format!("&epv={epv}"));
    }
    if let Some(track) = sample.track {
        query.push_str(&format!("&track={track}"));
    }
    query.push_str(&format!("&sendtime={:.6}", now.as_secs_f64()));

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{FixQuality, SampleClass};

    fn sample() -> Sample {
        Sample {
            class: SampleClass::Position,
            timestamp: SystemTime::now(),
            fix_quality: Some(FixQuality::Fix3D),
            latitude: Some(48.1374),
            longitude: Some(11.5755),
            altitude: Some(519.0),
            speed: Some(10.0),
            track: Some(271.5),
            epx: Some(8.3),
            epy: Some(11.2),
            epv: Some(23.0),
            used_satellites: None,
            visible_satellites: None,
        }
    }

    #[test]
    fn test_build_query_full_sample() {
        let query = build_query(&sample(), "rover1", Duration::from_secs(1_700_000_000));

        assert!(query.starts_with("id=rover1&timestamp=1700000000"));
        assert!(query.contains("&lat=48.1374"));
        assert!(query.contains("&lon=11.5755"));
        assert!(query.contains("&altitude=519"));
        assert!(query.contains("&speed=36")); // 10 m/s = 36 km/h
        assert!(query.contains("&bearing=271.5"));
        assert!(query.contains("&track=271.5"));
        assert!(query.contains("&epv=23"));
        assert!(query.contains("&sendtime=1700000000.000000"));
    }

    #[test]
    fn test_build_query_omits_absent_fields() {
        let mut sample = sample();
        sample.altitude = None;
        sample.epx = None;
        sample.epy = None;
        sample.epv = None;

        let query = build_query(&sample, "rover1", Duration::from_secs(1));
        assert!(!query.contains("altitude="));
        assert!(!query.contains("epx="));
        assert!(!query.contains("epv="));
        assert!(query.contains("&lat="));
    }

    #[tokio::test]
    async fn test_send_position_reports_transport_error() {
        // Nothing listens on this port
        let sink = TraccarSink::new("http://127.0.0.1:1".to_string(), "rover1".to_string());
        let result = sink.send_position(&sample()).await;
        assert!(matches!(result, Err(SinkError::Transport(_))));
    }
}
