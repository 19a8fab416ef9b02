//! Tracking engine with per-key serialization.
//!
//! Every update is a read-modify-write of one track document. Two updates for
//! the same key must not interleave, or one of the appended samples is lost
//! when the second write replaces the first. The engine therefore holds one
//! async mutex per track key; updates for different keys run in parallel.
//!
//! ```text
//! update(key) ──► key lock ──► load ──► record_sample ──► predict? ──► upsert
//!                 (per key)                                │
//!                                                          └── SensorCollection
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::model::{EpochMillis, LocationSample, SensorRecord, Track};
use crate::store::{SensorCollection, StoreResult, TrackCollection};

use super::config::TrackingConfig;
use super::predict::predict_arrivals;

/// Owns track maintenance for every sound type.
pub struct TrackingEngine {
    tracks: Arc<dyn TrackCollection>,
    sensors: Arc<dyn SensorCollection>,
    config: TrackingConfig,
    /// One lock per track key. Entries are never removed; the key space is
    /// the set of distinct sound-type labels.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TrackingEngine {
    /// Create an engine over the given collections.
    pub fn new(
        tracks: Arc<dyn TrackCollection>,
        sensors: Arc<dyn SensorCollection>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            tracks,
            sensors,
            config,
            locks: DashMap::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Apply one sample to the track stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Track key (lower-cased sound type)
    /// * `reporting_sensor` - Sensor that produced the sample
    /// * `sample` - Position and time of the triggering event
    /// * `now` - Reference time for eviction and arrival estimates
    ///
    /// # Errors
    ///
    /// Store failures are propagated. When the track write fails the stored
    /// track is unchanged.
    pub async fn update(
        &self,
        key: &str,
        reporting_sensor: &str,
        sample: LocationSample,
        now: EpochMillis,
    ) -> StoreResult<Track> {
        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        let mut track = self
            .tracks
            .get(key)
            .await?
            .unwrap_or_else(|| Track::new(key));

        let motion_recomputed = track.record_sample(sample, now, &self.config);
        trace!(
            key,
            samples = track.locations.len(),
            motion_recomputed,
            "Track sample recorded"
        );

        if track.speed > self.config.speed_threshold_mps {
            let reporter = reporting_sensor.to_string();
            let others = move |s: &SensorRecord| s.sensor_id != reporter;
            let candidates = self.sensors.find(&others).await?;

            track.predictions = predict_arrivals(
                sample.point(),
                track.speed,
                now,
                reporting_sensor,
                &candidates,
                self.config.prediction_horizon,
            );
            debug!(
                key,
                speed_mps = track.speed,
                direction_deg = track.direction,
                predictions = track.predictions.len(),
                "Predictions updated"
            );
        }

        self.tracks.upsert(track.clone()).await?;
        Ok(track)
    }

    /// Get or create the lock for `key`.
    ///
    /// The map shard guard is released before the caller awaits the mutex.
    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        Arc::clone(
            self.locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Number of distinct keys seen so far.
    pub fn key_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn engine(store: &MemoryStore) -> TrackingEngine {
        TrackingEngine::new(
            store.track_collection(),
            store.sensor_collection(),
            TrackingConfig::default(),
        )
    }

    fn sample(lat: f64, lon: f64, timestamp: EpochMillis) -> LocationSample {
        LocationSample::new(GeoPoint::new(lat, lon), timestamp)
    }

    async fn add_sensor(store: &MemoryStore, id: &str, lat: f64, lon: f64) {
        store
            .sensor_collection()
            .upsert(SensorRecord::online(id, GeoPoint::new(lat, lon), 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_creates_track_on_first_event() {
        let store = MemoryStore::new();
        let engine = engine(&store);

        let track = engine
            .update("drone", "s-1", sample(0.0, 0.0, 1_000), 1_000)
            .await
            .unwrap();

        assert_eq!(track.sound_type, "drone");
        assert_eq!(track.locations.len(), 1);
        let stored = store.track_collection().get("drone").await.unwrap().unwrap();
        assert_eq!(stored, track);
    }

    #[tokio::test]
    async fn test_fast_track_gets_predictions() {
        let store = MemoryStore::new();
        add_sensor(&store, "s-1", 0.0, 0.0).await;
        add_sensor(&store, "s-2", 0.0, 0.05).await;
        add_sensor(&store, "s-3", 0.0, 0.02).await;
        add_sensor(&store, "s-far", 5.0, 5.0).await;
        let engine = engine(&store);

        // 0.01° in 10 s is ~111 m/s
        engine
            .update("drone", "s-1", sample(0.0, 0.0, 0), 10_000)
            .await
            .unwrap();
        let track = engine
            .update("drone", "s-1", sample(0.0, 0.01, 10_000), 10_000)
            .await
            .unwrap();

        assert!(track.speed > 100.0);
        let ids: Vec<&str> = track.predictions.iter().map(|p| p.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["s-3", "s-2"]);
    }

    #[tokio::test]
    async fn test_slow_track_keeps_previous_predictions() {
        let store = MemoryStore::new();
        add_sensor(&store, "s-2", 0.0, 0.05).await;
        let engine = engine(&store);

        engine
            .update("drone", "s-1", sample(0.0, 0.0, 0), 10_000)
            .await
            .unwrap();
        let fast = engine
            .update("drone", "s-1", sample(0.0, 0.01, 10_000), 10_000)
            .await
            .unwrap();
        assert_eq!(fast.predictions.len(), 1);

        // Barely moving: ~0.1 m/s
        let slow = engine
            .update("drone", "s-1", sample(0.0, 0.01001, 20_000), 20_000)
            .await
            .unwrap();
        assert!(slow.speed <= 1.0);
        assert_eq!(slow.predictions, fast.predictions);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryStore::new();
        let engine = engine(&store);

        engine
            .update("drone", "s-1", sample(0.0, 0.0, 0), 0)
            .await
            .unwrap();
        engine
            .update("siren", "s-1", sample(1.0, 1.0, 0), 0)
            .await
            .unwrap();

        assert_eq!(store.tracks.len(), 2);
        assert_eq!(engine.key_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_updates_same_key_not_lost() {
        let store = MemoryStore::new();
        let engine = Arc::new(
            TrackingEngine::new(
                store.track_collection(),
                store.sensor_collection(),
                TrackingConfig::default().with_retention(Duration::from_secs(3600)),
            ),
        );

        let mut handles = Vec::new();
        for i in 0..64i64 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine
                    .update("drone", "s-1", sample(0.0, i as f64 * 1e-4, i * 1_000), 100_000)
                    .await
                    .unwrap();
            }));
        }
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        let track = store.track_collection().get("drone").await.unwrap().unwrap();
        assert_eq!(track.locations.len(), 64);
    }
}
