//! Collection traits for the document store.
//!
//! The engine needs three logical collections: an append-only alert log,
//! sensor liveness records keyed by sensor id, and tracks keyed by
//! lower-cased sound type. Each is a small trait so that any backend can be
//! passed in as an explicit dependency.
//!
//! # Design Principles
//!
//! - **Document replace**: `upsert` overwrites the whole document for a key
//! - **Owned reads**: lookups return clones, never references into the store
//! - **Dyn-compatible**: `Pin<Box<dyn Future>>` returns allow `Arc<dyn ...>`
//!
//! Timeouts are the backend's concern; the engine never waits on its own.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::model::{DetectionEvent, SensorRecord, Track};

/// Errors reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend is shutting down.
    #[error("Store is shutting down")]
    ShuttingDown,

    /// Backend-specific failure.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Predicate used to select sensor records.
pub type SensorPredicate = dyn Fn(&SensorRecord) -> bool + Send + Sync;

/// Append-only log of enriched detection events.
pub trait AlertCollection: Send + Sync {
    /// Append an event. Duplicate message ids are accepted.
    fn insert(&self, event: DetectionEvent) -> BoxFuture<'_, StoreResult<()>>;

    /// Find the first stored event carrying `message_id`.
    fn find_by_message_id(
        &self,
        message_id: &str,
    ) -> BoxFuture<'_, StoreResult<Option<DetectionEvent>>>;

    /// All stored events in insertion order.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<DetectionEvent>>>;
}

/// Sensor liveness records keyed by sensor id.
pub trait SensorCollection: Send + Sync {
    /// Insert or replace the record for `record.sensor_id`.
    fn upsert(&self, record: SensorRecord) -> BoxFuture<'_, StoreResult<()>>;

    /// Look up one sensor.
    fn get(&self, sensor_id: &str) -> BoxFuture<'_, StoreResult<Option<SensorRecord>>>;

    /// All sensors matching `predicate`.
    fn find<'a>(
        &'a self,
        predicate: &'a SensorPredicate,
    ) -> BoxFuture<'a, StoreResult<Vec<SensorRecord>>>;

    /// Every known sensor.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SensorRecord>>>;
}

/// Tracks keyed by lower-cased sound type.
pub trait TrackCollection: Send + Sync {
    /// Look up the track for `key`.
    fn get(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<Track>>>;

    /// Insert or replace the track stored under `track.sound_type`.
    fn upsert(&self, track: Track) -> BoxFuture<'_, StoreResult<()>>;

    /// Every stored track.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Track>>>;
}
