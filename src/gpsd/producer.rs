//! Supervised producer task: reads reports from gpsd and feeds the queue.
//!
//! # Design
//!
//! The producer owns the gpsd session lifecycle:
//!
//! - `new()` + `start()` spawns the read loop as a tokio task
//! - Each session read is wrapped in a staleness timeout; a silent source
//!   tears the session down and reconnects
//! - Connect failures back off exponentially (2^n seconds, capped)
//! - Every reconnect increments an observable restart counter
//! - Channel close detection for shutdown
//!
//! The consumer can also force a session restart through the returned
//! [`ProducerHandle`] when its own dequeue wait times out; the read loop
//! observes the request between reads and never interrupts a report that is
//! already buffered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use super::client::GpsdClient;
use super::report::GpsdReport;

/// Maximum backoff between connection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Producer configuration.
#[derive(Debug, Clone)]
pub struct ReportProducerConfig {
    /// gpsd host.
    pub host: String,

    /// gpsd port (default 2947).
    pub port: u16,

    /// Inactivity window: maximum tolerated silence from gpsd before the
    /// session is torn down and reopened. Typically larger than the
    /// consumer's dequeue timeout.
    pub stale_after: Duration,
}

impl Default for ReportProducerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2947,
            stale_after: Duration::from_secs(30),
        }
    }
}

/// Shared handle to a running producer.
///
/// Lets the consumer request a session restart and observe how many times
/// the session has been rebuilt.
#[derive(Debug, Clone, Default)]
pub struct ProducerHandle {
    restart_requested: Arc<Notify>,
    restarts: Arc<AtomicU64>,
}

impl ProducerHandle {
    /// Ask the producer to tear down and reopen its gpsd session.
    pub fn request_restart(&self) {
        self.restart_requested.notify_one();
    }

    /// Number of session restarts since start (reconnects after a stall,
    /// stream end, or an explicit restart request).
    pub fn restart_count(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }
}

/// The producer side of the ingestion pipeline.
pub struct ReportProducer {
    config: ReportProducerConfig,
    report_tx: mpsc::Sender<GpsdReport>,
    handle: ProducerHandle,
}

/// Why the current session ended.
enum SessionEnd {
    StreamClosed,
    Stalled,
    RestartRequested,
    ChannelClosed,
}

impl ReportProducer {
    /// Create a new producer feeding `report_tx`.
    pub fn new(config: ReportProducerConfig, report_tx: mpsc::Sender<GpsdReport>) -> Self {
        Self {
            config,
            report_tx,
            handle: ProducerHandle::default(),
        }
    }

    /// Handle for restart requests and the restart counter.
    pub fn handle(&self) -> ProducerHandle {
        self.handle.clone()
    }

    /// Start the producer as an async task. Runs until the report channel
    /// closes.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        info!(
            host = %self.config.host,
            port = self.config.port,
            stale_after_secs = self.config.stale_after.as_secs(),
            "gpsd producer started"
        );

        let mut consecutive_failures: u32 = 0;
        let mut first_session = true;

        loop {
            if self.report_tx.is_closed() {
                break;
            }

            if !first_session {
                self.handle.restarts.fetch_add(1, Ordering::Relaxed);
            }

            if consecutive_failures > 0 {
                let backoff = calculate_backoff(consecutive_failures);
                debug!(
                    backoff_secs = backoff.as_secs(),
                    consecutive_failures, "backing off before reconnecting to gpsd"
                );
                tokio::time::sleep(backoff).await;
            }

            let mut client =
                match GpsdClient::connect(&self.config.host, self.config.port).await {
                    Ok(client) => client,
                    Err(e) => {
                        consecutive_failures += 1;
                        first_session = false;
                        warn!(error = %e, consecutive_failures, "gpsd connect failed");
                        continue;
                    }
                };
            consecutive_failures = 0;
            first_session = false;

            // A restart requested while the session was already down is
            // satisfied by this connect; drop the stale permit so the
            // fresh session is not immediately torn down.
            self.handle.restart_requested.notified().now_or_never();

            match self.stream_session(&mut client).await {
                SessionEnd::StreamClosed => {
                    warn!("gpsd closed the report stream, reconnecting");
                }
                SessionEnd::Stalled => {
                    warn!(
                        stale_after_secs = self.config.stale_after.as_secs(),
                        "no report from gpsd within the staleness window, reconnecting"
                    );
                }
                SessionEnd::RestartRequested => {
                    info!("session restart requested, reconnecting to gpsd");
                }
                SessionEnd::ChannelClosed => break,
            }
        }

        info!(
            restarts = self.handle.restart_count(),
            "gpsd producer stopped"
        );
    }

    /// Drain one session until it ends.
    async fn stream_session(&self, client: &mut GpsdClient) -> SessionEnd {
        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(self.config.stale_after, client.next_report()) => next,
                _ = self.handle.restart_requested.notified() => {
                    return SessionEnd::RestartRequested;
                }
            };

            match next {
                Ok(Some(report)) => {
                    if self.report_tx.send(report).await.is_err() {
                        debug!("report channel closed, stopping producer");
                        return SessionEnd::ChannelClosed;
                    }
                }
                Ok(None) => return SessionEnd::StreamClosed,
                Err(_) => return SessionEnd::Stalled,
            }
        }
    }
}

/// Exponential backoff: 2^n seconds, capped at [`MAX_BACKOFF`].
fn calculate_backoff(consecutive_failures: u32) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_failures.min(20));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
