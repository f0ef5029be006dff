//! gpsbridge daemon entry point.
//!
//! Wires the pieces together: configuration, logging, the gpsd producer,
//! the sinks, and the consumer loop. Runs until interrupted; on Ctrl-C the
//! MQTT session is disconnected cleanly and the producer is dropped.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use gpsbridge::config::{config_file_path, Settings};
use gpsbridge::gpsd::{ReportProducer, ReportProducerConfig};
use gpsbridge::logging;
use gpsbridge::pipeline::Bridge;
use gpsbridge::sink::{Dispatcher, MqttSink, TraccarSink};

/// Queue depth between the producer and the consumer. gpsd emits a few
/// reports per second; the policy keeps the consumer far ahead of this.
const REPORT_QUEUE_DEPTH: usize = 64;

#[derive(Parser)]
#[command(name = "gpsbridge", version = gpsbridge::VERSION)]
#[command(about = "Bridge gpsd position reports to Traccar and MQTT", long_about = None)]
struct Args {
    /// Path to the config file (default: ~/.gpsbridge/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _logging_guard =
        match logging::init_logging(logging::default_log_dir(), logging::default_log_file(), args.debug) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: failed to initialize logging: {e}");
                process::exit(1);
            }
        };

    let config_path = args.config.unwrap_or_else(config_file_path);
    let settings = match Settings::load_from(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            // A bad policy must never start streaming
            error!(path = %config_path.display(), error = %e, "configuration rejected");
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    info!(
        version = gpsbridge::VERSION,
        config = %config_path.display(),
        mqtt_enabled = settings.mqtt.enabled,
        traccar_enabled = settings.traccar.enabled,
        "gpsbridge starting"
    );

    if !settings.mqtt.enabled && !settings.traccar.enabled {
        info!("no sink enabled; reports will be classified but not forwarded");
    }

    let tracking = settings
        .traccar
        .enabled
        .then(|| TraccarSink::new(settings.traccar.url.clone(), settings.traccar.id.clone()));

    let (retained, mqtt_client) = if settings.mqtt.enabled {
        let (sink, _monitor) = MqttSink::connect(&settings.mqtt);
        let client = sink.client();
        (Some(sink), Some(client))
    } else {
        (None, None)
    };

    let (report_tx, report_rx) = mpsc::channel(REPORT_QUEUE_DEPTH);
    let producer = ReportProducer::new(
        ReportProducerConfig {
            host: settings.gpsd.host.clone(),
            port: settings.gpsd.port,
            stale_after: settings.gpsd.stale_after,
        },
        report_tx,
    );
    let producer_handle = producer.handle();
    let producer_task = producer.start();

    let bridge = Bridge::new(
        report_rx,
        producer_handle,
        settings.policy.to_report_policy(),
        Dispatcher::new(tracking, retained),
        settings.gpsd.timeout,
    );

    tokio::select! {
        stats = bridge.run() => {
            // Only reachable if the producer task died with the queue
            error!(?stats, "consumer loop ended unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }

    if let Some(client) = mqtt_client {
        let _ = client.disconnect().await;
    }
    producer_task.abort();

    info!("gpsbridge stopped");
}
