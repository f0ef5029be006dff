//! The consumer side of the ingestion pipeline.
//!
//! [`Bridge`] drains the report queue with a bounded wait, normalizes each
//! report, runs the significance engine against the last-forwarded state,
//! dispatches emitted samples, and records the new state. It is the single
//! writer of [`ReportedState`]; the producer never touches decision state,
//! so no locking exists around it, and dispatch stays synchronous within
//! the loop to keep it that way.
//!
//! A dequeue timeout treats the source as stalled: the loop asks the
//! producer to rebuild its gpsd session and goes back to waiting. The loop
//! itself never terminates on an error, only when the queue closes
//! (producer gone, i.e. shutdown).

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::gpsd::{GpsdReport, ProducerHandle};
use crate::policy::{decide, ReportPolicy, ReportedState};
use crate::sample::normalize;
use crate::sink::{Dispatcher, RetainedSink, TrackingSink};

/// Counters for one bridge run, logged at stop and inspected by tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    /// Reports dequeued.
    pub received: u64,
    /// Samples forwarded to the dispatcher.
    pub emitted: u64,
    /// Usable samples the policy suppressed.
    pub suppressed: u64,
    /// Dequeue timeouts that requested a session restart.
    pub stalls: u64,
}

/// The consumer loop: queue → normalize → decide → dispatch → state.
pub struct Bridge<T: TrackingSink, R: RetainedSink> {
    report_rx: mpsc::Receiver<GpsdReport>,
    producer: ProducerHandle,
    policy: ReportPolicy,
    dispatcher: Dispatcher<T, R>,
    /// Bounded dequeue wait; a timeout restarts the source session.
    dequeue_timeout: Duration,
    state: ReportedState,
    stats: BridgeStats,
}

impl<T: TrackingSink, R: RetainedSink> Bridge<T, R> {
    pub fn new(
        report_rx: mpsc::Receiver<GpsdReport>,
        producer: ProducerHandle,
        policy: ReportPolicy,
        dispatcher: Dispatcher<T, R>,
        dequeue_timeout: Duration,
    ) -> Self {
        Self {
            report_rx,
            producer,
            policy,
            dispatcher,
            dequeue_timeout,
            state: ReportedState::default(),
            stats: BridgeStats::default(),
        }
    }

    /// Run until the report queue closes. Returns the final counters.
    pub async fn run(mut self) -> BridgeStats {
        info!(
            dequeue_timeout_secs = self.dequeue_timeout.as_secs(),
            "bridge consumer loop started"
        );

        loop {
            match tokio::time::timeout(self.dequeue_timeout, self.report_rx.recv()).await {
                Err(_) => {
                    self.stats.stalls += 1;
                    warn!(
                        timeout_secs = self.dequeue_timeout.as_secs(),
                        stalls = self.stats.stalls,
                        "no report within the dequeue window, requesting source restart"
                    );
                    self.producer.request_restart();
                }
                Ok(None) => break,
                Ok(Some(report)) => {
                    self.stats.received += 1;
                    self.handle_report(&report).await;
                }
            }
        }

        info!(
            received = self.stats.received,
            emitted = self.stats.emitted,
            suppressed = self.stats.suppressed,
            stalls = self.stats.stalls,
            source_restarts = self.producer.restart_count(),
            "bridge consumer loop stopped"
        );
        self.stats
    }

    async fn handle_report(&mut self, report: &GpsdReport) {
        let Some(sample) = normalize(report, self.policy.min_speed) else {
            trace!("non-observation report, ignored");
            return;
        };

        let now = Instant::now();
        let decision = decide(&sample, &self.state, &self.policy, now);

        if !decision.emit {
            if sample.is_usable() {
                self.stats.suppressed += 1;
            }
            trace!(class = ?sample.class, "sample suppressed");
            return;
        }

        debug!(
            class = ?sample.class,
            reason = ?decision.reason,
            "sample emitted"
        );

        // Both sinks complete (or fail) before the state moves forward; a
        // sink failure still counts as reported so a flapping sink cannot
        // turn the policy into a firehose.
        self.dispatcher.dispatch(&sample).await;
        self.state.record_emit(&sample, now);
        self.stats.emitted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpsd::report::TpvReport;
    use crate::sample::Sample;
    use crate::sink::SinkError;

    struct NullTracking;
    impl TrackingSink for NullTracking {
        async fn send_position(&self, _sample: &Sample) -> Result<(), SinkError> {
            Ok(())
        }
    }

    struct FailingTracking;
    impl TrackingSink for FailingTracking {
        async fn send_position(&self, _sample: &Sample) -> Result<(), SinkError> {
            Err(SinkError::HttpStatus(503))
        }
    }

    struct NullRetained;
    impl RetainedSink for NullRetained {
        fn is_connected(&self) -> bool {
            true
        }
        async fn publish_sample(&mut self, _sample: &Sample) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn tpv(lat: f64, lon: f64, speed: f64) -> GpsdReport {
        GpsdReport::Tpv(TpvReport {
            mode: Some(3),
            lat: Some(lat),
            lon: Some(lon),
            speed: Some(speed),
            track: Some(0.0),
            ..Default::default()
        })
    }

    fn bridge(
        rx: mpsc::Receiver<GpsdReport>,
    ) -> Bridge<NullTracking, NullRetained> {
        Bridge::new(
            rx,
            ProducerHandle::default(),
            ReportPolicy::default(),
            Dispatcher::new(Some(NullTracking), Some(NullRetained)),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_first_fix_emits_then_stationary_suppressed() {
        let (tx, rx) = mpsc::channel(16);

        for _ in 0..5 {
            tx.send(tpv(48.0, 11.0, 0.0)).await.unwrap();
        }
        drop(tx);

        let stats = bridge(rx).run().await;
        assert_eq!(stats.received, 5);
        assert_eq!(stats.emitted, 1); // first heartbeat only
        assert_eq!(stats.suppressed, 4);
    }

    #[tokio::test]
    async fn test_non_observation_reports_ignored() {
        let (tx, rx) = mpsc::channel(16);
        tx.send(GpsdReport::Watch { enable: Some(true) })
            .await
            .unwrap();
        tx.send(GpsdReport::Version {
            release: None,
            rev: None,
        })
        .await
        .unwrap();
        drop(tx);

        let stats = bridge(rx).run().await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.emitted, 0);
        assert_eq!(stats.suppressed, 0);
    }

    #[tokio::test]
    async fn test_dequeue_timeout_requests_restart_and_keeps_running() {
        let (tx, rx) = mpsc::channel(16);
        let producer = ProducerHandle::default();

        let bridge = Bridge::new(
            rx,
            producer.clone(),
            ReportPolicy::default(),
            Dispatcher::new(Some(NullTracking), Some(NullRetained)),
            Duration::from_millis(50),
        );
        let task = tokio::spawn(bridge.run());

        // Let at least one dequeue window elapse, then deliver a report
        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(tpv(48.0, 11.0, 0.0)).await.unwrap();
        drop(tx);

        let stats = task.await.unwrap();
        assert!(stats.stalls >= 1);
        assert_eq!(stats.received, 1);
        assert_eq!(stats.emitted, 1);
    }

    #[tokio::test]
    async fn test_failing_sink_still_updates_state() {
        let (tx, rx) = mpsc::channel(16);

        // Two identical stationary fixes: were the failed dispatch not
        // recorded, the second would emit again as a fresh heartbeat.
        tx.send(tpv(48.0, 11.0, 0.0)).await.unwrap();
        tx.send(tpv(48.0, 11.0, 0.0)).await.unwrap();
        drop(tx);

        let bridge = Bridge::new(
            rx,
            ProducerHandle::default(),
            ReportPolicy::default(),
            Dispatcher::new(Some(FailingTracking), Some(NullRetained)),
            Duration::from_millis(200),
        );

        let stats = bridge.run().await;
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.suppressed, 1);
    }
}
