//! Navigation math for the reporting policy.
//!
//! Provides the two nontrivial numeric routines the significance rules rely
//! on (great-circle distance and shortest-path bearing delta) plus the
//! 8-point compass mapping used by the MQTT `direction` topic.
//!
//! Distance uses the haversine formula on a spherical earth. That is a
//! deliberate approximation: the movement threshold is on the order of tens
//! of meters, where the error against a geodesic computation is negligible.

use std::f64::consts::PI;

/// Mean earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// 8-point compass rose, clockwise from north.
const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Great-circle distance in kilometers between two lat/lon points.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let dlat = (lat2 - lat1) * DEG_TO_RAD;
    let dlon = (lon2 - lon1) * DEG_TO_RAD;

    let a = (dlat / 2.0).sin().powi(2)
        + (lat1 * DEG_TO_RAD).cos() * (lat2 * DEG_TO_RAD).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Absolute shortest-path difference between two bearings, in degrees.
///
/// Folds the raw difference into [0, 180] so that crossing north is not
/// counted as a near-full turn: `bearing_change(10.0, 350.0) == 20.0`.
pub fn bearing_change(b1: f64, b2: f64) -> f64 {
    let mut r = (b2 - b1).rem_euclid(360.0);
    if r >= 180.0 {
        r -= 360.0;
    }
    r.abs()
}

/// Map a track in degrees to an 8-point compass direction.
///
/// Sector boundaries sit halfway between points: anything within 22.5° of
/// due north maps to "N", and so on around the rose.
pub fn track_to_compass(track: f64) -> &'static str {
    let index = ((track + 22.5).rem_euclid(360.0) / 45.0) as usize;
    COMPASS_POINTS[index.min(7)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        assert!(haversine_km((52.52, 13.405), (52.52, 13.405)) < 1e-12);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Berlin to Hamburg, roughly 255 km
        let d = haversine_km((52.52, 13.405), (53.5511, 9.9937));
        assert!(d > 250.0 && d < 260.0, "got {d}");
    }

    #[test]
    fn test_haversine_short_distance() {
        // ~11m of latitude at the equator: 0.0001 deg
        let d = haversine_km((0.0, 0.0), (0.0001, 0.0));
        assert!((d - 0.01112).abs() < 0.0005, "got {d}");
    }

    #[test]
    fn test_bearing_change_symmetric() {
        for &(a, b) in &[(0.0, 90.0), (10.0, 350.0), (180.0, 0.0), (359.0, 1.0)] {
            assert_eq!(bearing_change(a, b), bearing_change(b, a));
        }
    }

    #[test]
    fn test_bearing_change_wraps_north() {
        assert!((bearing_change(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((bearing_change(359.0, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_change_plain() {
        assert!((bearing_change(90.0, 100.0) - 10.0).abs() < 1e-9);
        assert!((bearing_change(0.0, 180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_compass_cardinals() {
        assert_eq!(track_to_compass(0.0), "N");
        assert_eq!(track_to_compass(90.0), "E");
        assert_eq!(track_to_compass(180.0), "S");
        assert_eq!(track_to_compass(270.0), "W");
        assert_eq!(track_to_compass(359.9), "N");
    }

    #[test]
    fn test_compass_sector_boundary() {
        assert_eq!(track_to_compass(22.4), "N");
        assert_eq!(track_to_compass(22.6), "NE");
        assert_eq!(track_to_compass(44.0), "NE");
    }
}
