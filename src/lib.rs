//! gpsbridge - gpsd to Traccar/MQTT bridge with an adaptive reporting policy
//!
//! This library connects to a local gpsd instance, watches its JSON report
//! stream, and forwards the reports that matter to a Traccar tracking server
//! and/or an MQTT broker with retained per-field topics.
//!
//! # Architecture
//!
//! ```text
//! gpsd ──▶ gpsd::producer ──▶ mpsc queue ──▶ pipeline::Bridge
//!                                                │
//!                                  sample::normalize → policy::decide
//!                                                │ (emit)
//!                                          sink::Dispatcher
//!                                            ├─▶ Traccar (HTTP GET)
//!                                            └─▶ MQTT (retained topics)
//! ```
//!
//! The producer reads from gpsd as fast as reports arrive and restarts its
//! session when the stream stalls. The consumer drains the queue with a
//! bounded wait, classifies each report against the last-forwarded state via
//! [`policy::decide`], and hands emitted samples to the dispatcher. Each sink
//! fails independently; a broker outage never blocks the tracking endpoint
//! and vice versa.

pub mod config;
pub mod geo;
pub mod gpsd;
pub mod logging;
pub mod pipeline;
pub mod policy;
pub mod sample;
pub mod sink;
pub mod units;

/// Version of the gpsbridge library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
