//! Read-side access to stored alerts, sensors and tracks, plus sensor
//! registration.
//!
//! This is a thin layer over the collections; it performs no computation
//! beyond key normalization.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::clock::Clock;
use crate::geo::GeoPoint;
use crate::model::{track_key, DetectionEvent, SensorRecord, Track};
use crate::store::{AlertCollection, SensorCollection, StoreResult, TrackCollection};

/// Body of a sensor registration request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorRegistration {
    pub sensor_id: String,
    pub location: GeoPoint,
}

/// Listing and registration over the store collections.
pub struct QueryService {
    alerts: Arc<dyn AlertCollection>,
    sensors: Arc<dyn SensorCollection>,
    tracks: Arc<dyn TrackCollection>,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(
        alerts: Arc<dyn AlertCollection>,
        sensors: Arc<dyn SensorCollection>,
        tracks: Arc<dyn TrackCollection>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            sensors,
            tracks,
            clock,
        }
    }

    /// Every stored alert, oldest first.
    pub async fn alerts(&self) -> StoreResult<Vec<DetectionEvent>> {
        self.alerts.list().await
    }

    /// Every known sensor, ordered by id.
    pub async fn sensors(&self) -> StoreResult<Vec<SensorRecord>> {
        let mut sensors = self.sensors.list().await?;
        sensors.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
        Ok(sensors)
    }

    /// Every track, ordered by sound type.
    pub async fn tracks(&self) -> StoreResult<Vec<Track>> {
        let mut tracks = self.tracks.list().await?;
        tracks.sort_by(|a, b| a.sound_type.cmp(&b.sound_type));
        Ok(tracks)
    }

    /// The track for a sound-type label (case-insensitive).
    pub async fn track(&self, sound_type: &str) -> StoreResult<Option<Track>> {
        self.tracks.get(&track_key(sound_type)).await
    }

    /// Register or refresh a sensor, marking it online as of now.
    pub async fn register_sensor(
        &self,
        registration: SensorRegistration,
    ) -> StoreResult<SensorRecord> {
        let record = SensorRecord::online(
            registration.sensor_id,
            registration.location,
            self.clock.now_millis(),
        );
        self.sensors.upsert(record.clone()).await?;
        info!(sensor_id = %record.sensor_id, "Sensor registered");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::SensorStatus;
    use crate::store::MemoryStore;

    fn service(store: &MemoryStore, clock: Arc<ManualClock>) -> QueryService {
        QueryService::new(
            store.alert_collection(),
            store.sensor_collection(),
            store.track_collection(),
            clock,
        )
    }

    #[tokio::test]
    async fn test_register_sensor_upserts() {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(1_000));
        let service = service(&store, clock.clone());

        let registration: SensorRegistration = serde_json::from_value(serde_json::json!({
            "sensor_id": "mic-1",
            "location": {"latitude": 1.0, "longitude": 2.0}
        }))
        .unwrap();
        service.register_sensor(registration.clone()).await.unwrap();

        clock.set(2_000);
        let record = service.register_sensor(registration).await.unwrap();

        assert_eq!(record.status, SensorStatus::Online);
        let sensors = service.sensors().await.unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].last_seen, 2_000);
    }

    #[tokio::test]
    async fn test_track_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .track_collection()
            .upsert(Track::new("drone-x200"))
            .await
            .unwrap();
        let service = service(&store, Arc::new(ManualClock::new(0)));

        assert!(service.track("Drone-X200").await.unwrap().is_some());
        assert!(service.track("siren").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listings_are_sorted() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store
                .sensor_collection()
                .upsert(SensorRecord::online(id, GeoPoint::new(0.0, 0.0), 0))
                .await
                .unwrap();
            store
                .track_collection()
                .upsert(Track::new(id))
                .await
                .unwrap();
        }
        let service = service(&store, Arc::new(ManualClock::new(0)));

        let ids: Vec<String> = service
            .sensors()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.sensor_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let keys: Vec<String> = service
            .tracks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.sound_type)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(service.alerts().await.unwrap().is_empty());
    }
}
