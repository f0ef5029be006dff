//! MQTT retained-topic sink.
//!
//! Publishes the fields of an emitted sample under a topic prefix, one
//! retained publish per field, and only when the formatted value actually
//! changed since the last publish of that field. Late subscribers therefore
//! always see the full current state without any replay.
//!
//! # Connection handling
//!
//! `connect()` spawns a monitor task that drives the rumqttc event loop.
//! The task owns reconnection: a dropped broker connection is retried
//! continuously with a short pause, and a shared connected flag tracks the
//! session state. The dispatcher reads that flag before each publish cycle
//! (the sink watchdog) and skips the broker while it is down; the sample
//! itself is never dropped from consideration.
//!
//! # Topics
//!
//! Under `{prefix}/`: `fix`, `latitude`, `longitude`, `altitude` (feet),
//! `speed` (mph), `direction` (8-point compass), `2d_accuracy` and
//! `3d_accuracy` (feet, rounded to tens), `satellites`,
//! `satellites_visible`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectionError, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use super::{RetainedSink, SinkError};
use crate::config::MqttSettings;
use crate::geo::track_to_compass;
use crate::sample::{Sample, SampleClass};
use crate::units::{meters_to_feet, mps_to_mph};

/// Pause before re-polling the event loop after a connection error.
/// rumqttc re-establishes the session on the next poll.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

/// MQTT sink with field-level change suppression.
pub struct MqttSink {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    topic_prefix: String,
    retain: bool,
    last_published: HashMap<&'static str, String>,
}

impl MqttSink {
    /// Build the sink and spawn its connection monitor task.
    ///
    /// The monitor runs until the client is dropped (its request queue
    /// closes), so the returned handle is only needed for shutdown joins.
    pub fn connect(settings: &MqttSettings) -> (Self, tokio::task::JoinHandle<()>) {
        let mut options = MqttOptions::new("gpsbridge", settings.broker.clone(), settings.port);
        options.set_keep_alive(Duration::from_secs(60));
        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            options.set_credentials(user.clone(), pass.clone());
        }

        let (client, eventloop) = AsyncClient::new(options, 16);
        let connected = Arc::new(AtomicBool::new(false));

        let monitor = tokio::spawn(run_connection_monitor(
            eventloop,
            Arc::clone(&connected),
            settings.broker.clone(),
        ));

        let sink = Self {
            client,
            connected,
            topic_prefix: settings.topic_prefix.clone(),
            retain: settings.retain,
            last_published: HashMap::new(),
        };
        (sink, monitor)
    }

    /// A cloned client handle, usable for a graceful disconnect on
    /// shutdown after the sink itself has moved into the dispatcher.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }
}

impl RetainedSink for MqttSink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn publish_sample(&mut self, sample: &Sample) -> Result<(), SinkError> {
        let fields = changed_fields(sample, &self.last_published);

        for (topic, value) in fields {
            let full_topic = format!("{}/{}", self.topic_prefix, topic);
            debug!(topic = %full_topic, value = %value, "publishing");
            self.client
                .publish(full_topic, QoS::AtLeastOnce, self.retain, value.clone())
                .await
                .map_err(|e| SinkError::Publish(e.to_string()))?;

            self.last_published.insert(topic, value);
        }

        Ok(())
    }
}

/// Drive the event loop forever: track session state, pause after errors.
async fn run_connection_monitor(
    mut eventloop: rumqttc::EventLoop,
    connected: Arc<AtomicBool>,
    broker: String,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(broker = %broker, "mqtt connected");
                connected.store(true, Ordering::Relaxed);
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                debug!("mqtt client dropped, stopping connection monitor");
                break;
            }
            Err(e) => {
                if connected.swap(false, Ordering::Relaxed) {
                    warn!(broker = %broker, error = %e, "mqtt connection lost, reconnecting");
                } else {
                    debug!(broker = %broker, error = %e, "mqtt reconnect attempt failed");
                }
                tokio::time::sleep(RECONNECT_PAUSE).await;
            }
        }
    }
}

/// Format the publishable fields of a sample and keep only those whose
/// formatted value differs from the last publish. Pure; the publish loop
/// owns the map update.
fn changed_fields(
    sample: &Sample,
    last: &HashMap<&'static str, String>,
) -> Vec<(&'static str, String)> {
    let mut fields: Vec<(&'static str, String)> = Vec::new();
    let mut push = |topic: &'static str, value: String| {
        if last.get(topic) != Some(&value) {
            fields.push((topic, value));
        }
    };

    match sample.class {
        SampleClass::Position => {
            if let Some(quality) = sample.fix_quality {
                push("fix", quality.label().to_string());
            }
            if let Some(lat) = sample.latitude {
                push("latitude", lat.to_string());
            }
            if let Some(lon) = sample.longitude {
                push("longitude", lon.to_string());
            }
            if let Some(alt) = sample.altitude {
                push("altitude", format!("{}", meters_to_feet(alt).round() as i64));
            }
            if let Some(speed) = sample.speed {
                push("speed", mps_to_mph(speed).to_string());
            }
            if let Some(track) = sample.track {
                push("direction", track_to_compass(track).to_string());
            }
            if let (Some(epx), Some(epy)) = (sample.epx, sample.epy) {
                let cep_ft = meters_to_feet((epx * epx + epy * epy).sqrt());
                push("2d_accuracy", format!("{}", round_to_tens(cep_ft)));

                if let Some(epv) = sample.epv {
                    let sep_ft = meters_to_feet((epx * epx + epy * epy + epv * epv).sqrt());
                    push("3d_accuracy", format!("{}", round_to_tens(sep_ft)));
                }
            }
        }
        SampleClass::SkyView => {
            if let Some(used) = sample.used_satellites {
                push("satellites", used.to_string());
            }
            if let Some(visible) = sample.visible_satellites {
                push("satellites_visible", visible.to_string());
            }
        }
    }

    fields
}

/// Round to the nearest ten. Error estimates below ~5 ft are noise anyway.
fn round_to_tens(value: f64) -> i64 {
    ((value / 10.0).round() * 10.0) as i64
}
