//! One TCP session against a gpsd daemon.
//!
//! A session connects, enables watching in JSON mode, and then yields parsed
//! [`GpsdReport`]s until the daemon closes the stream. Lines that fail to
//! parse are logged and skipped; only stream termination ends the session.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace};

use super::report::GpsdReport;

/// Watch command enabling JSON report streaming.
const WATCH_ENABLE: &str = r#"?WATCH={"enable":true,"json":true};"#;

/// Error type for gpsd sessions.
#[derive(Debug, thiserror::Error)]
pub enum GpsdError {
    /// Failed to open the TCP connection to gpsd.
    #[error("failed to connect to gpsd at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to send the ?WATCH command.
    #[error("failed to enable watch mode: {0}")]
    Watch(#[from] LinesCodecError),
}

/// A live, watching gpsd session.
pub struct GpsdClient {
    framed: Framed<TcpStream, LinesCodec>,
    lines_read: u64,
}

impl GpsdClient {
    /// Connect to gpsd and enable JSON watching.
    pub async fn connect(host: &str, port: u16) -> Result<Self, GpsdError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| GpsdError::Connect {
                addr: addr.clone(),
                source: e,
            })?;

        let mut framed = Framed::new(stream, LinesCodec::new());
        framed.send(WATCH_ENABLE).await?;

        info!(addr = %addr, "gpsd session established, watching");
        Ok(Self {
            framed,
            lines_read: 0,
        })
    }

    /// Read the next report from the session.
    ///
    /// Returns `None` when the daemon closes the stream. Lines that are not
    /// valid report JSON (framing hiccups, unknown shapes) are skipped, so a
    /// `Some` is always a parsed report.
    pub async fn next_report(&mut self) -> Option<GpsdReport> {
        loop {
            let line = match self.framed.next().await? {
                Ok(line) => line,
                Err(e) => {
                    debug!(error = %e, "gpsd framing error, skipping line");
                    continue;
                }
            };

            self.lines_read += 1;
            // Char-wise, not a byte slice: a multi-byte character on the
            // boundary must not panic the producer over a log preview.
            let preview: String = line.chars().take(60).collect();
            if self.lines_read == 1 {
                debug!(preview = %preview, "first line from gpsd");
            }

            match serde_json::from_str::<GpsdReport>(&line) {
                Ok(report) => {
                    trace!(line = %line, "gpsd report");
                    return Some(report);
                }
                Err(e) => {
                    debug!(error = %e, preview = %preview, "unparsable gpsd line, skipping");
                }
            }
        }
    }
}
