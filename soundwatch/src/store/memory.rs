//! In-process store backend.
//!
//! Keyed collections use `DashMap` so that concurrent upserts for different
//! keys never contend on a single lock. The alert log is a plain vector
//! behind a `parking_lot::RwLock`; it is append-only and read rarely.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::model::{DetectionEvent, SensorRecord, Track};
use crate::store::traits::{
    AlertCollection, BoxFuture, SensorCollection, SensorPredicate, StoreResult, TrackCollection,
};

/// Append-only alert log held in memory.
#[derive(Debug, Default)]
pub struct MemoryAlertCollection {
    events: RwLock<Vec<DetectionEvent>>,
}

impl MemoryAlertCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl AlertCollection for MemoryAlertCollection {
    fn insert(&self, event: DetectionEvent) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.events.write().push(event);
            Ok(())
        })
    }

    fn find_by_message_id(
        &self,
        message_id: &str,
    ) -> BoxFuture<'_, StoreResult<Option<DetectionEvent>>> {
        let message_id = message_id.to_string();
        Box::pin(async move {
            Ok(self
                .events
                .read()
                .iter()
                .find(|e| e.message_id == message_id)
                .cloned())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<DetectionEvent>>> {
        Box::pin(async move { Ok(self.events.read().clone()) })
    }
}

/// Sensor records held in memory, keyed by sensor id.
#[derive(Debug, Default)]
pub struct MemorySensorCollection {
    sensors: DashMap<String, SensorRecord>,
}

impl MemorySensorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl SensorCollection for MemorySensorCollection {
    fn upsert(&self, record: SensorRecord) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.sensors.insert(record.sensor_id.clone(), record);
            Ok(())
        })
    }

    fn get(&self, sensor_id: &str) -> BoxFuture<'_, StoreResult<Option<SensorRecord>>> {
        let sensor_id = sensor_id.to_string();
        Box::pin(async move { Ok(self.sensors.get(&sensor_id).map(|r| r.value().clone())) })
    }

    fn find<'a>(
        &'a self,
        predicate: &'a SensorPredicate,
    ) -> BoxFuture<'a, StoreResult<Vec<SensorRecord>>> {
        Box::pin(async move {
            Ok(self
                .sensors
                .iter()
                .filter(|entry| predicate(entry.value()))
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SensorRecord>>> {
        Box::pin(async move {
            Ok(self
                .sensors
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }
}

/// Tracks held in memory, keyed by lower-cased sound type.
#[derive(Debug, Default)]
pub struct MemoryTrackCollection {
    tracks: DashMap<String, Track>,
}

impl MemoryTrackCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl TrackCollection for MemoryTrackCollection {
    fn get(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<Track>>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.tracks.get(&key).map(|t| t.value().clone())) })
    }

    fn upsert(&self, track: Track) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.tracks.insert(track.sound_type.clone(), track);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Track>>> {
        Box::pin(async move {
            Ok(self
                .tracks
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }
}

/// The three in-memory collections bundled together.
///
/// Concrete handles stay accessible for inspection; the `*_collection`
/// accessors hand out trait objects for wiring into the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub alerts: Arc<MemoryAlertCollection>,
    pub sensors: Arc<MemorySensorCollection>,
    pub tracks: Arc<MemoryTrackCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_collection(&self) -> Arc<dyn AlertCollection> {
        self.alerts.clone()
    }

    pub fn sensor_collection(&self) -> Arc<dyn SensorCollection> {
        self.sensors.clone()
    }

    pub fn track_collection(&self) -> Arc<dyn TrackCollection> {
        self.tracks.clone()
    }
}
