//! Canonical samples and the fix normalizer.
//!
//! [`normalize`] is the only place that looks at raw gpsd report shapes.
//! It converts each TPV or SKY report into a [`Sample`] with explicitly
//! optional fields, decided once; downstream code never re-probes the wire
//! format. Internal units are SI (meters, meters/second, degrees).

use std::time::SystemTime;

use crate::gpsd::report::GpsdReport;

/// Which report family produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleClass {
    /// Time-position-velocity (gpsd TPV).
    Position,
    /// Satellite constellation snapshot (gpsd SKY).
    SkyView,
}

/// Quality of the positioning solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixQuality {
    NoFix,
    Fix2D,
    Fix3D,
}

impl FixQuality {
    /// Map gpsd's TPV `mode` field. Unknown values count as no fix.
    pub fn from_mode(mode: i32) -> Self {
        match mode {
            2 => Self::Fix2D,
            3 => Self::Fix3D,
            _ => Self::NoFix,
        }
    }

    /// A 2D or 3D solution exists.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Fix2D | Self::Fix3D)
    }

    /// Human-readable label, as published on the MQTT `fix` topic.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoFix => "NO FIX",
            Self::Fix2D => "2D FIX",
            Self::Fix3D => "3D FIX",
        }
    }
}

/// One normalized observation.
///
/// A field is `Some` only if the source actually reported it that cycle;
/// absent is never conflated with zero.
#[derive(Debug, Clone)]
pub struct Sample {
    pub class: SampleClass,
    /// When the sample was observed.
    pub timestamp: SystemTime,
    /// Fix quality (Position only).
    pub fix_quality: Option<FixQuality>,
    /// Degrees north.
    pub latitude: Option<f64>,
    /// Degrees east.
    pub longitude: Option<f64>,
    /// Meters above mean sea level.
    pub altitude: Option<f64>,
    /// Meters/second, jitter-floored: values below the policy's minimum
    /// speed are exactly zero.
    pub speed: Option<f64>,
    /// Degrees from true north, [0, 360).
    pub track: Option<f64>,
    /// Longitude error estimate, meters.
    pub epx: Option<f64>,
    /// Latitude error estimate, meters.
    pub epy: Option<f64>,
    /// Vertical error estimate, meters.
    pub epv: Option<f64>,
    /// Satellites used in the solution (SkyView only).
    pub used_satellites: Option<u32>,
    /// Satellites in view (SkyView only).
    pub visible_satellites: Option<u32>,
}

impl Sample {
    fn empty(class: SampleClass) -> Self {
        Self {
            class,
            timestamp: SystemTime::now(),
            fix_quality: None,
            latitude: None,
            longitude: None,
            altitude: None,
            speed: None,
            track: None,
            epx: None,
            epy: None,
            epv: None,
            used_satellites: None,
            visible_satellites: None,
        }
    }

    /// True if the sample can be evaluated by the significance rules:
    /// a Position sample with a 2D/3D fix, or any SkyView sample.
    pub fn is_usable(&self) -> bool {
        match self.class {
            SampleClass::Position => self.fix_quality.is_some_and(|q| q.is_usable()),
            SampleClass::SkyView => true,
        }
    }
}

/// Convert a raw gpsd report into a canonical sample.
///
/// Returns `None` for report classes that carry no observation (VERSION,
/// WATCH, DEVICES, unknown). `min_speed` is the jitter floor in m/s: a
/// reported speed below it becomes exactly zero rather than small nonzero
/// noise.
pub fn normalize(report: &GpsdReport, min_speed: f64) -> Option<Sample> {
    match report {
        GpsdReport::Tpv(tpv) => {
            let mut sample = Sample::empty(SampleClass::Position);
            sample.fix_quality = tpv.mode.map(FixQuality::from_mode);
            sample.latitude = tpv.lat;
            sample.longitude = tpv.lon;
            sample.altitude = tpv.alt;
            sample.speed = tpv.speed.map(|s| if s < min_speed { 0.0 } else { s });
            sample.track = tpv.track;
            sample.epx = tpv.epx;
            sample.epy = tpv.epy;
            sample.epv = tpv.epv;
            Some(sample)
        }
        GpsdReport::Sky(sky) => {
            let mut sample = Sample::empty(SampleClass::SkyView);
            sample.used_satellites = sky.used_count();
            sample.visible_satellites = sky.visible_count();
            Some(sample)
        }
        _ => None,
    }
}
