//! Unit conversions for sink-facing formatting.
//!
//! Samples carry SI units internally (meters, meters/second, degrees).
//! These helpers convert at the formatting boundary only, so a value is
//! never converted twice.

/// Feet per meter.
const FEET_PER_METER: f64 = 3.28084;

/// Miles per hour per meter/second.
const MPH_PER_MPS: f64 = 2.23694;

/// Convert meters to feet.
pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

/// Convert meters/second to miles per hour.
pub fn mps_to_mph(mps: f64) -> f64 {
    mps * MPH_PER_MPS
}

/// Convert meters/second to kilometers per hour.
pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}

/// Convert kilometers per hour to meters/second.
pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}
