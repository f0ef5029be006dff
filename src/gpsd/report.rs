//! Serde model of the gpsd JSON report stream.
//!
//! These are our own types, decoupled from any gpsd client crate. Only the
//! fields the bridge consumes are modeled; everything else is ignored so
//! that newer gpsd versions with extra fields keep parsing.
//!
//! Every field that gpsd may omit is an `Option`. A receiver without a fix
//! sends TPV objects with no `lat`/`lon` at all, and absence must stay
//! distinguishable from zero all the way through normalization.

use serde::Deserialize;

/// One object from the gpsd report stream, discriminated by `class`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class")]
pub enum GpsdReport {
    /// Time-position-velocity report.
    #[serde(rename = "TPV")]
    Tpv(TpvReport),

    /// Sky view: satellite constellation snapshot.
    #[serde(rename = "SKY")]
    Sky(SkyReport),

    /// Daemon version banner, sent once on connect.
    #[serde(rename = "VERSION")]
    Version {
        release: Option<String>,
        rev: Option<String>,
    },

    /// Echo of the current watch policy.
    #[serde(rename = "WATCH")]
    Watch { enable: Option<bool> },

    /// Device inventory. Carries nothing the bridge needs.
    #[serde(rename = "DEVICES")]
    Devices {},

    /// Any other class (ATT, TOFF, PPS, ...). Ignored.
    #[serde(other)]
    Other,
}

/// TPV: a position/velocity solution at an instant.
///
/// `mode` is the fix quality: 0 unknown, 1 no fix, 2 two-dimensional,
/// 3 three-dimensional. Speed is meters/second, track is degrees from
/// true north, error estimates are meters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpvReport {
    pub mode: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub epx: Option<f64>,
    pub epy: Option<f64>,
    pub epv: Option<f64>,
}

/// SKY: the satellites currently in view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkyReport {
    /// Count of satellites used in the solution, when gpsd provides it.
    #[serde(rename = "uSat")]
    pub used: Option<u32>,
    /// Count of satellites in view, when gpsd provides it.
    #[serde(rename = "nSat")]
    pub visible: Option<u32>,
    /// Per-satellite records; older gpsd versions send only this.
    #[serde(default)]
    pub satellites: Vec<Satellite>,
}

/// One satellite in a SKY report.
#[derive(Debug, Clone, Deserialize)]
pub struct Satellite {
    #[serde(rename = "PRN")]
    pub prn: Option<i32>,
    #[serde(default)]
    pub used: bool,
}

impl SkyReport {
    /// Satellites used in the solution, preferring the report's own count
    /// over counting the satellite list.
    pub fn used_count(&self) -> Option<u32> {
        match self.used {
            Some(n) => Some(n),
            None if self.satellites.is_empty() => None,
            None => Some(self.satellites.iter().filter(|s| s.used).count() as u32),
        }
    }

    /// Satellites in view, falling back to the list length.
    pub fn visible_count(&self) -> Option<u32> {
        match self.visible {
            Some(n) => Some(n),
            None if self.satellites.is_empty() => None,
            None => Some(self.satellites.len() as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tpv_full_fix() {
        let json = r#"{
            "class": "TPV", "device": "/dev/ttyACM0", "mode": 3,
            "time": "2026-08-30T11:42:07.000Z",
            "lat": 48.1374, "lon": 11.5755, "alt": 519.2,
            "speed": 4.63, "track": 271.5,
            "epx": 8.3, "epy": 11.2, "epv": 23.0
        }"#;

        let report: GpsdReport = serde_json::from_str(json).unwrap();
        let GpsdReport::Tpv(tpv) = report else {
            panic!("expected TPV");
        };
        assert_eq!(tpv.mode, Some(3));
        assert!((tpv.lat.unwrap() - 48.1374).abs() < 1e-9);
        assert!((tpv.speed.unwrap() - 4.63).abs() < 1e-9);
    }

    #[test]
    fn test_tpv_without_fix_has_absent_fields() {
        let json = r#"{"class": "TPV", "device": "/dev/ttyACM0", "mode": 1}"#;

        let report: GpsdReport = serde_json::from_str(json).unwrap();
        let GpsdReport::Tpv(tpv) = report else {
            panic!("expected TPV");
        };
        assert_eq!(tpv.mode, Some(1));
        assert!(tpv.lat.is_none());
        assert!(tpv.speed.is_none());
    }

    #[test]
    fn test_sky_prefers_reported_counts() {
        let json = r#"{
            "class": "SKY", "uSat": 9, "nSat": 14,
            "satellites": [{"PRN": 5, "used": true}]
        }"#;

        let report: GpsdReport = serde_json::from_str(json).unwrap();
        let GpsdReport::Sky(sky) = report else {
            panic!("expected SKY");
        };
        assert_eq!(sky.used_count(), Some(9));
        assert_eq!(sky.visible_count(), Some(14));
    }

    #[test]
    fn test_sky_counts_from_satellite_list() {
        let json = r#"{
            "class": "SKY",
            "satellites": [
                {"PRN": 5, "used": true},
                {"PRN": 12, "used": true},
                {"PRN": 29, "used": false}
            ]
        }"#;

        let report: GpsdReport = serde_json::from_str(json).unwrap();
        let GpsdReport::Sky(sky) = report else {
            panic!("expected SKY");
        };
        assert_eq!(sky.used_count(), Some(2));
        assert_eq!(sky.visible_count(), Some(3));
    }

    #[test]
    fn test_sky_empty_is_absent() {
        let sky = SkyReport::default();
        assert_eq!(sky.used_count(), None);
        assert_eq!(sky.visible_count(), None);
    }

    #[test]
    fn test_unknown_class_tolerated() {
        let json = r#"{"class": "PPS", "device": "/dev/ttyACM0"}"#;
        let report: GpsdReport = serde_json::from_str(json).unwrap();
        assert!(matches!(report, GpsdReport::Other));
    }

    #[test]
    fn test_version_banner() {
        let json = r#"{"class": "VERSION", "release": "3.25", "rev": "3.25", "proto_major": 3, "proto_minor": 15}"#;
        let report: GpsdReport = serde_json::from_str(json).unwrap();
        assert!(matches!(report, GpsdReport::Version { .. }));
    }
}
