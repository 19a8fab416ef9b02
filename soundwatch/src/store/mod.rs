//! Document store collaborator.
//!
//! The engine reaches persistence only through the collection traits defined
//! here. [`MemoryStore`] is the in-process backend used by tests and the
//! replay command.

mod memory;
mod traits;

pub use memory::{
    MemoryAlertCollection, MemorySensorCollection, MemoryStore, MemoryTrackCollection,
};
pub use traits::{
    AlertCollection, BoxFuture, SensorCollection, SensorPredicate, StoreError, StoreResult,
    TrackCollection,
};
