//! The significance engine: decides which samples are worth forwarding.
//!
//! [`decide`] is a pure function of `(sample, prior, policy, now)`. The only
//! state it consults is the last-forwarded snapshot, owned by the consumer
//! loop and passed in by reference; the engine itself holds nothing. That
//! keeps it independently testable and immune to races with the producer.
//!
//! Rules are evaluated in priority order and the first match wins. The
//! returned [`EmitReason`] identifies that rule; it exists for logging and
//! tests, not behavior. A rule whose required fields are absent from the
//! sample is skipped, never treated as a match.

use std::time::{Duration, Instant};

use crate::geo::{bearing_change, haversine_km};
use crate::sample::{Sample, SampleClass};

/// Immutable reporting-policy thresholds.
///
/// Intervals of zero disable their rule. Speeds are meters/second (the
/// config layer converts from km/h), distance is kilometers, angles degrees.
#[derive(Debug, Clone)]
pub struct ReportPolicy {
    /// Unconditional heartbeat interval per class. Zero disables.
    pub always_interval: Duration,
    /// Minimum interval between movement-triggered reports. Zero disables.
    pub move_interval: Duration,
    /// Minimum interval between turn-triggered reports while moving. Zero
    /// disables.
    pub track_interval: Duration,
    /// Minimum interval between satellite-count reports. Zero means every
    /// change reports.
    pub sky_min_interval: Duration,
    /// Distance that counts as movement, kilometers.
    pub move_distance_km: f64,
    /// Track change that counts as a turn, degrees.
    pub track_change_deg: f64,
    /// Speed change reported immediately, m/s.
    pub speed_change: f64,
    /// Jitter floor applied at normalization, m/s.
    pub min_speed: f64,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            always_interval: Duration::from_secs(60),
            move_interval: Duration::from_secs(10),
            track_interval: Duration::from_secs(2),
            sky_min_interval: Duration::ZERO,
            move_distance_km: 0.01,
            track_change_deg: 5.0,
            speed_change: crate::units::kmh_to_mps(10.0),
            min_speed: crate::units::kmh_to_mps(2.0),
        }
    }
}

/// Last-forwarded values for one sample class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassState {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub used_satellites: Option<u32>,
    /// When this class last emitted. `None` means never, which satisfies
    /// every elapsed-interval test.
    pub last_emit: Option<Instant>,
}

impl ClassState {
    fn elapsed_at_least(&self, now: Instant, interval: Duration) -> bool {
        match self.last_emit {
            Some(t) => now.duration_since(t) >= interval,
            None => true,
        }
    }
}

/// The last snapshot actually forwarded, one slot per sample class.
///
/// Single writer: the consumer loop, immediately after a successful emit
/// decision. Independent per-class timers are intentional; a sky-only
/// change must not reset the position heartbeat or vice versa.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedState {
    pub position: ClassState,
    pub sky: ClassState,
}

impl ReportedState {
    /// The slot for a sample's class.
    pub fn class_state(&self, class: SampleClass) -> &ClassState {
        match class {
            SampleClass::Position => &self.position,
            SampleClass::SkyView => &self.sky,
        }
    }

    /// Record an emitted sample: copy its present fields into the class
    /// slot and stamp the emit time. Absent fields keep their prior value
    /// so the next comparison still has a baseline.
    pub fn record_emit(&mut self, sample: &Sample, now: Instant) {
        let slot = match sample.class {
            SampleClass::Position => &mut self.position,
            SampleClass::SkyView => &mut self.sky,
        };
        if sample.latitude.is_some() {
            slot.latitude = sample.latitude;
        }
        if sample.longitude.is_some() {
            slot.longitude = sample.longitude;
        }
        if sample.speed.is_some() {
            slot.speed = sample.speed;
        }
        if sample.track.is_some() {
            slot.track = sample.track;
        }
        if sample.used_satellites.is_some() {
            slot.used_satellites = sample.used_satellites;
        }
        slot.last_emit = Some(now);
    }
}

/// Which rule matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitReason {
    /// Unconditional interval elapsed.
    Heartbeat,
    /// Speed changed by more than the threshold.
    SpeedJump,
    /// Started or stopped moving.
    MotionEdge,
    /// Moved beyond the distance threshold, movement interval elapsed.
    Movement,
    /// Moved beyond the distance threshold and turned, track interval
    /// elapsed.
    TrackChange,
    /// Used-satellite count changed.
    SatCountChange,
}

/// The engine's verdict for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub emit: bool,
    pub reason: Option<EmitReason>,
}

impl Decision {
    const SUPPRESS: Self = Self {
        emit: false,
        reason: None,
    };

    fn emit(reason: EmitReason) -> Self {
        Self {
            emit: true,
            reason: Some(reason),
        }
    }
}

/// Decide whether a sample is significant enough to forward.
///
/// Samples without a usable class (Position with no 2D/3D fix) are always
/// suppressed; the fix-status gate lives here, ahead of every rule.
pub fn decide(sample: &Sample, prior: &ReportedState, policy: &ReportPolicy, now: Instant) -> Decision {
    if !sample.is_usable() {
        return Decision::SUPPRESS;
    }

    let state = prior.class_state(sample.class);

    // Rule 1: heartbeat, per class.
    if !policy.always_interval.is_zero() && state.elapsed_at_least(now, policy.always_interval) {
        return Decision::emit(EmitReason::Heartbeat);
    }

    match sample.class {
        SampleClass::Position => decide_position(sample, state, policy, now),
        SampleClass::SkyView => decide_sky(sample, state, policy, now),
    }
}

fn decide_position(
    sample: &Sample,
    state: &ClassState,
    policy: &ReportPolicy,
    now: Instant,
) -> Decision {
    // Rule 2: hard acceleration or braking.
    if let (Some(prev), Some(cur)) = (state.speed, sample.speed) {
        if (prev - cur).abs() > policy.speed_change {
            return Decision::emit(EmitReason::SpeedJump);
        }

        // Rule 3: start/stop transition.
        if (prev == 0.0 && cur > 0.0) || (prev > 0.0 && cur == 0.0) {
            return Decision::emit(EmitReason::MotionEdge);
        }
    }

    // Rule 4: movement cadence.
    let moved = match (state.latitude, state.longitude, sample.latitude, sample.longitude) {
        (Some(plat), Some(plon), Some(lat), Some(lon)) => {
            haversine_km((plat, plon), (lat, lon)) > policy.move_distance_km
        }
        _ => false,
    };
    if moved {
        if !policy.move_interval.is_zero() && state.elapsed_at_least(now, policy.move_interval) {
            return Decision::emit(EmitReason::Movement);
        }

        if !policy.track_interval.is_zero() && state.elapsed_at_least(now, policy.track_interval) {
            if let (Some(prev), Some(cur)) = (state.track, sample.track) {
                if bearing_change(prev, cur) > policy.track_change_deg {
                    return Decision::emit(EmitReason::TrackChange);
                }
            }
        }
    }

    Decision::SUPPRESS
}

fn decide_sky(sample: &Sample, state: &ClassState, policy: &ReportPolicy, now: Instant) -> Decision {
    // Rule 5: used-satellite count changed. A class that never reported
    // counts as changed.
    if let Some(used) = sample.used_satellites {
        if state.used_satellites != Some(used)
            && state.elapsed_at_least(now, policy.sky_min_interval)
        {
            return Decision::emit(EmitReason::SatCountChange);
        }
    }

    Decision::SUPPRESS
}
