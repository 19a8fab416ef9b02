//! Detection event ingestion.
//!
//! Entry point for messages arriving from sensors. Parses and validates the
//! payload, enriches it through the classifier, records the event and the
//! sensor's liveness, feeds the tracking engine, and acknowledges.
//!
//! # Example
//!
//! ```ignore
//! use soundwatch::bus::MemoryBus;
//! use soundwatch::ingest::IngestionListener;
//!
//! let bus = Arc::new(MemoryBus::new());
//! let inbound = bus.subscribe(TopicScheme::default().alert_subscription())?;
//!
//! let listener = Arc::new(IngestionListener::new(alerts, sensors, engine, bus.clone(), clock));
//! let shutdown = CancellationToken::new();
//! tokio::spawn(listener.run(inbound, shutdown.clone()));
//! ```

mod config;
mod error;
mod listener;
mod metrics;
mod payload;

pub use config::{IngestConfig, DEFAULT_MAX_IN_FLIGHT};
pub use error::{IngestError, ParseError};
pub use listener::{IngestOutcome, IngestionListener};
pub use metrics::{IngestMetrics, IngestSnapshot};
pub use payload::DetectionPayload;
