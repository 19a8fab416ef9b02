//! Per-sound-type movement tracking.
//!
//! Each sound type owns one [`Track`](crate::model::Track): a short,
//! time-bounded history of where it was heard, the speed and bearing derived
//! from the two latest positions, and a ranked list of sensors the source is
//! expected to reach next.
//!
//! # Example
//!
//! ```ignore
//! use soundwatch::store::MemoryStore;
//! use soundwatch::tracking::{TrackingConfig, TrackingEngine};
//!
//! let store = MemoryStore::new();
//! let engine = TrackingEngine::new(
//!     store.track_collection(),
//!     store.sensor_collection(),
//!     TrackingConfig::default(),
//! );
//!
//! let track = engine.update("drone", "sensor-7", sample, now).await?;
//! println!("{:.1} m/s heading {:.0}°", track.speed, track.direction);
//! ```

mod config;
mod engine;
mod history;
mod predict;

pub use config::{
    TrackingConfig, DEFAULT_MAX_SAMPLES, DEFAULT_PREDICTION_HORIZON, DEFAULT_RETENTION,
    DEFAULT_SPEED_THRESHOLD_MPS,
};
pub use engine::TrackingEngine;
pub use predict::predict_arrivals;
