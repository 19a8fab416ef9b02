//! SoundWatch - acoustic sensor ingestion and sound-source tracking
//!
//! This library consumes detection events reported by a network of acoustic
//! sensors, classifies them, and keeps one movement track per sound type.
//! Each track derives speed and bearing from its most recent positions and
//! ranks the other sensors by estimated arrival time of the sound source.
//!
//! # Architecture
//!
//! ```text
//! MessageBus ──► IngestionListener ──► Classifier
//!                      │
//!                      ├──► AlertCollection   (append enriched event)
//!                      ├──► SensorCollection  (liveness upsert)
//!                      ├──► TrackingEngine ──► TrackCollection
//!                      │        (per-key lock)     ▲
//!                      │                           └── predictions
//!                      └──► Publisher (ack)
//! ```
//!
//! The store and the transport are collaborators behind traits
//! ([`store::AlertCollection`], [`store::SensorCollection`],
//! [`store::TrackCollection`], [`bus::Publisher`]). In-process
//! implementations are provided for tests and replays.

pub mod bus;
pub mod classify;
pub mod clock;
pub mod config;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod query;
pub mod store;
pub mod tracking;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
