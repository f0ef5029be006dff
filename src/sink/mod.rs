//! Outbound sinks and the reporter dispatch.
//!
//! Two sink families exist: a tracking endpoint receiving one HTTP request
//! per emitted Position sample ([`traccar`]) and a retained-topic broker
//! receiving one publish per changed field ([`mqtt`]). The [`Dispatcher`]
//! drives whichever sinks are enabled and contains failures per sink: a
//! dead broker never blocks the tracking endpoint, and neither ever aborts
//! the consumer loop. No inline retries; the next emitted sample is the
//! retry.

pub mod mqtt;
pub mod traccar;

use std::future::Future;

use tracing::{debug, warn};

use crate::sample::{Sample, SampleClass};

pub use mqtt::MqttSink;
pub use traccar::TraccarSink;

/// Error type shared by all sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Transport-level failure (connect, DNS, write).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint rejected report: HTTP {0}")]
    HttpStatus(u16),

    /// A publish could not be handed to the broker connection.
    #[error("publish failed: {0}")]
    Publish(String),
}

/// A sink receiving whole Position samples (the tracking endpoint).
pub trait TrackingSink: Send {
    /// Deliver one emitted Position sample.
    fn send_position(&self, sample: &Sample)
        -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// A sink receiving per-field retained publishes (the broker).
pub trait RetainedSink: Send {
    /// Whether the persistent connection currently reports itself up.
    /// Used by the pre-dispatch connectivity check; a `false` is logged
    /// and the cycle proceeds without this sink.
    fn is_connected(&self) -> bool;

    /// Publish the changed fields of one emitted sample.
    fn publish_sample(
        &mut self,
        sample: &Sample,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Per-sink delivery results for one dispatch cycle. `None` means the sink
/// is not enabled or not applicable to the sample class.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub tracking_ok: Option<bool>,
    pub retained_ok: Option<bool>,
}

/// Reporter dispatch: fans an emitted sample out to the enabled sinks.
pub struct Dispatcher<T: TrackingSink, R: RetainedSink> {
    tracking: Option<T>,
    retained: Option<R>,
}

impl<T: TrackingSink, R: RetainedSink> Dispatcher<T, R> {
    pub fn new(tracking: Option<T>, retained: Option<R>) -> Self {
        Self { tracking, retained }
    }

    /// Deliver one emitted sample to each enabled sink independently.
    ///
    /// The tracking endpoint only receives Position samples; the broker
    /// receives both classes. Failures are logged and contained, never
    /// propagated.
    pub async fn dispatch(&mut self, sample: &Sample) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        if sample.class == SampleClass::Position {
            if let Some(tracking) = &self.tracking {
                outcome.tracking_ok = Some(match tracking.send_position(sample).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "tracking sink delivery failed");
                        false
                    }
                });
            }
        }

        if let Some(retained) = &mut self.retained {
            if retained.is_connected() {
                outcome.retained_ok = Some(match retained.publish_sample(sample).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "retained sink publish failed");
                        false
                    }
                });
            } else {
                debug!("retained sink disconnected, skipping publish this cycle");
                outcome.retained_ok = Some(false);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{FixQuality, Sample, SampleClass};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::SystemTime;

    fn position_sample() -> Sample {
        Sample {
            class: SampleClass::Position,
            timestamp: SystemTime::now(),
            fix_quality: Some(FixQuality::Fix3D),
            latitude: Some(48.0),
            longitude: Some(11.0),
            altitude: Some(500.0),
            speed: Some(3.0),
            track: Some(90.0),
            epx: None,
            epy: None,
            epv: None,
            used_satellites: None,
            visible_satellites: None,
        }
    }

    fn sky_sample() -> Sample {
        Sample {
            class: SampleClass::SkyView,
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
            used_satellites: Some(9),
            visible_satellites: Some(12),
        }
    }

    struct MockTracking {
        fail: bool,
        calls: AtomicU32,
    }

    impl TrackingSink for &MockTracking {
        async fn send_position(&self, _sample: &Sample) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SinkError::HttpStatus(500))
            } else {
                Ok(())
            }
        }
    }

    struct MockRetained {
        connected: bool,
        fail: bool,
        calls: u32,
    }

    impl RetainedSink for MockRetained {
        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn publish_sample(&mut self, _sample: &Sample) -> Result<(), SinkError> {
            self.calls += 1;
            if self.fail {
                Err(SinkError::Publish("broker away".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_failing_tracking_sink_does_not_block_retained() {
        let tracking = MockTracking {
            fail: true,
            calls: AtomicU32::new(0),
        };
        let retained = MockRetained {
            connected: true,
            fail: false,
            calls: 0,
        };
        let mut dispatcher = Dispatcher::new(Some(&tracking), Some(retained));

        let outcome = dispatcher.dispatch(&position_sample()).await;
        assert_eq!(outcome.tracking_ok, Some(false));
        assert_eq!(outcome.retained_ok, Some(true));
        assert_eq!(tracking.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnected_retained_sink_is_skipped_not_fatal() {
        let tracking = MockTracking {
            fail: false,
            calls: AtomicU32::new(0),
        };
        let retained = MockRetained {
            connected: false,
            fail: false,
            calls: 0,
        };
        let mut dispatcher = Dispatcher::new(Some(&tracking), Some(retained));

        let outcome = dispatcher.dispatch(&position_sample()).await;
        assert_eq!(outcome.tracking_ok, Some(true));
        assert_eq!(outcome.retained_ok, Some(false));
    }

    #[tokio::test]
    async fn test_sky_sample_skips_tracking_sink() {
        let tracking = MockTracking {
            fail: false,
            calls: AtomicU32::new(0),
        };
        let retained = MockRetained {
            connected: true,
            fail: false,
            calls: 0,
        };
        let mut dispatcher = Dispatcher::new(Some(&tracking), Some(retained));

        let outcome = dispatcher.dispatch(&sky_sample()).await;
        assert_eq!(outcome.tracking_ok, None);
        assert_eq!(outcome.retained_ok, Some(true));
        assert_eq!(tracking.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_sinks_enabled_is_a_no_op() {
        let mut dispatcher: Dispatcher<&MockTracking, MockRetained> = Dispatcher::new(None, None);
        let outcome = dispatcher.dispatch(&position_sample()).await;
        assert_eq!(outcome, DispatchOutcome::default());
    }
}
