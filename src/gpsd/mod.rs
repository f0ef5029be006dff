//! gpsd session handling: wire types, TCP client, and the supervised
//! producer task.
//!
//! gpsd speaks newline-delimited JSON over TCP (default port 2947). After
//! connecting, a client sends a `?WATCH` command and then receives an
//! unbounded stream of report objects discriminated by their `class` field.
//!
//! # Components
//!
//! - [`report`] - serde model of the report stream (TPV, SKY, ...)
//! - [`client`] - one TCP session: connect, enable watch, read reports
//! - [`producer`] - the supervised read loop feeding the pipeline queue,
//!   with staleness detection and reconnect

pub mod client;
pub mod producer;
pub mod report;

pub use client::{GpsdClient, GpsdError};
pub use producer::{ProducerHandle, ReportProducer, ReportProducerConfig};
pub use report::GpsdReport;
