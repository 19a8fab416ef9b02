//! Ingestion listener.
//!
//! Drives one detection message through the full pipeline:
//!
//! ```text
//! InboundMessage
//!   │ parse + validate ──► Malformed: log, count, stop (nothing committed)
//!   ▼
//! enrich (category, intensity, processed_at, first_timestamp)
//!   ▼
//! AlertCollection::insert
//!   ▼
//! SensorCollection::upsert (online, last_seen = now)
//!   ▼
//! TrackingEngine::update (key = lower-cased sound type)
//!   ▼
//! Publisher::publish ack ──► {prefix}/{sensor_id}/ack
//! ```
//!
//! There is no transaction across steps. A failing step stops the message;
//! effects of earlier steps remain and no ack is sent.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::IngestConfig;
use super::error::IngestError;
use super::metrics::{IngestMetrics, IngestSnapshot};
use super::payload::DetectionPayload;
use crate::bus::{BusError, InboundMessage, Publisher, TopicScheme};
use crate::clock::Clock;
use crate::model::{Acknowledgement, SensorRecord};
use crate::store::{AlertCollection, SensorCollection};
use crate::tracking::TrackingEngine;

/// Result of a successfully handled message.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The event was stored, the track updated and the ack published.
    Processed {
        message_id: String,
        sensor_id: String,
        track_key: String,
        speed_mps: f64,
        predictions: usize,
    },
    /// The message id was already stored; only the ack was re-sent.
    Duplicate { message_id: String },
}

/// Consumes detection messages and applies them to the store and tracks.
pub struct IngestionListener {
    alerts: Arc<dyn AlertCollection>,
    sensors: Arc<dyn SensorCollection>,
    engine: Arc<TrackingEngine>,
    publisher: Arc<dyn Publisher>,
    clock: Arc<dyn Clock>,
    topics: TopicScheme,
    config: IngestConfig,
    metrics: Arc<IngestMetrics>,
    /// Message ids currently being deduplicated. An entry lives only while
    /// some task holds or awaits its lock.
    claims: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive hold on one message id; released on drop.
struct MessageClaim<'a> {
    claims: &'a DashMap<String, Arc<Mutex<()>>>,
    message_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MessageClaim<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left means nobody is waiting
        self.claims
            .remove_if(&self.message_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl IngestionListener {
    /// Create a listener with default topics and configuration.
    pub fn new(
        alerts: Arc<dyn AlertCollection>,
        sensors: Arc<dyn SensorCollection>,
        engine: Arc<TrackingEngine>,
        publisher: Arc<dyn Publisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            sensors,
            engine,
            publisher,
            clock,
            topics: TopicScheme::default(),
            config: IngestConfig::default(),
            metrics: Arc::new(IngestMetrics::new()),
            claims: DashMap::new(),
        }
    }

    /// Use a different topic scheme.
    pub fn with_topics(mut self, topics: TopicScheme) -> Self {
        self.topics = topics;
        self
    }

    /// Use a different ingest configuration.
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Shared handle to the counters.
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn metrics_snapshot(&self) -> IngestSnapshot {
        self.metrics.snapshot()
    }

    /// Process one inbound message to completion.
    ///
    /// Failures are logged and counted here; the returned error is for
    /// callers that want to react to it.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<IngestOutcome, IngestError> {
        self.metrics.message_received();
        let result = self.process(message).await;

        match &result {
            Ok(IngestOutcome::Processed { .. }) => self.metrics.message_processed(),
            Ok(IngestOutcome::Duplicate { message_id }) => {
                debug!(message_id = %message_id, "Duplicate message acknowledged");
                self.metrics.duplicate_skipped();
            }
            Err(e) if e.is_malformed() => {
                warn!(topic = %message.topic, error = %e, "Rejected detection message");
                self.metrics.message_rejected();
            }
            Err(e) => {
                error!(topic = %message.topic, error = %e, "Error processing message");
                self.metrics.message_failed();
            }
        }

        result
    }

    async fn process(&self, message: &InboundMessage) -> Result<IngestOutcome, IngestError> {
        let payload = DetectionPayload::parse(&message.payload)?;

        if let Some(topic_sensor) = self.topics.sensor_id_from_alert_topic(&message.topic) {
            if topic_sensor != payload.sensor_id {
                warn!(
                    topic = %message.topic,
                    sensor_id = %payload.sensor_id,
                    "Sensor id in topic differs from payload; using payload"
                );
            }
        }

        // Held until this message is fully applied, so a concurrent
        // redelivery sees the stored alert
        let _claim = if self.config.deduplicate {
            Some(self.claim(&payload.message_id).await)
        } else {
            None
        };

        if self.config.deduplicate
            && self
                .alerts
                .find_by_message_id(&payload.message_id)
                .await?
                .is_some()
        {
            self.acknowledge(&payload.sensor_id, &payload.message_id)
                .await?;
            return Ok(IngestOutcome::Duplicate {
                message_id: payload.message_id,
            });
        }

        let now = self.clock.now_millis();
        let event = payload.enrich(now);

        self.alerts.insert(event.clone()).await?;
        info!(
            message_id = %event.message_id,
            sensor_id = %event.sensor_id,
            sound_type = %event.sound_type,
            category = %event.category,
            intensity = event.intensity,
            "Saved alert"
        );

        self.sensors
            .upsert(SensorRecord::online(&event.sensor_id, event.location, now))
            .await?;

        let track_key = event.track_key();
        let track = self
            .engine
            .update(&track_key, &event.sensor_id, event.sample(), now)
            .await?;

        self.acknowledge(&event.sensor_id, &event.message_id).await?;

        Ok(IngestOutcome::Processed {
            message_id: event.message_id,
            sensor_id: event.sensor_id,
            track_key,
            speed_mps: track.speed,
            predictions: track.predictions.len(),
        })
    }

    /// Wait for exclusive use of `message_id`.
    async fn claim(&self, message_id: &str) -> MessageClaim<'_> {
        let lock = Arc::clone(
            self.claims
                .entry(message_id.to_string())
                .or_default()
                .value(),
        );
        let guard = lock.lock_owned().await;
        MessageClaim {
            claims: &self.claims,
            message_id: message_id.to_string(),
            guard: Some(guard),
        }
    }

    async fn acknowledge(&self, sensor_id: &str, message_id: &str) -> Result<(), IngestError> {
        let body = serde_json::to_vec(&Acknowledgement::received(message_id))
            .map_err(BusError::from)?;
        self.publisher
            .publish(&self.topics.ack_topic(sensor_id), body)
            .await?;
        self.metrics.ack_sent();
        Ok(())
    }

    /// Consume messages until the channel closes or `shutdown` fires.
    ///
    /// Each message runs on its own task. At most `max_in_flight` messages
    /// are processed at once; the loop waits for a free slot before taking
    /// the next message, and stays responsive to `shutdown` while waiting.
    /// In-flight messages are allowed to finish before this returns. A task
    /// that panics counts as a failed message.
    pub async fn run(
        self: Arc<Self>,
        mut inbound: mpsc::UnboundedReceiver<InboundMessage>,
        shutdown: CancellationToken,
    ) {
        let max_in_flight = self.config.max_in_flight.max(1);
        info!(max_in_flight, "Ingestion listener starting");

        let slots = Arc::new(Semaphore::new(max_in_flight));
        let mut tasks = JoinSet::new();

        loop {
            let permit = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.reap(joined);
                    continue;
                }

                acquired = Arc::clone(&slots).acquire_owned() => match acquired {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let message = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.reap(joined);
                    continue;
                }

                received = inbound.recv() => match received {
                    Some(message) => message,
                    None => {
                        debug!("Inbound stream closed");
                        break;
                    }
                },
            };

            let listener = Arc::clone(&self);
            tasks.spawn(async move {
                let _permit = permit;
                // Outcome is logged and counted by handle_message
                let _ = listener.handle_message(&message).await;
            });
        }

        if shutdown.is_cancelled() {
            info!("Ingestion listener shutting down");
        }

        while let Some(joined) = tasks.join_next().await {
            self.reap(joined);
        }

        let snapshot = self.metrics.snapshot();
        info!(
            received = snapshot.received,
            processed = snapshot.processed,
            rejected = snapshot.rejected,
            failed = snapshot.failed,
            "Ingestion listener stopped"
        );
    }

    fn reap(&self, joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            error!(error = %e, "Message task panicked");
            self.metrics.message_failed();
        }
    }
}
