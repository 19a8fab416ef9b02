//! Ingestion listener configuration.

/// Default cap on concurrently processed messages.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Configuration for the ingestion listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Maximum messages processed at the same time.
    pub max_in_flight: usize,

    /// Skip (but re-acknowledge) messages whose id is already stored.
    ///
    /// Off by default: every message is applied, even a repeated id.
    pub deduplicate: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            deduplicate: false,
        }
    }
}

impl IngestConfig {
    /// Set the concurrency cap.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Enable or disable message-id deduplication.
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }
}
