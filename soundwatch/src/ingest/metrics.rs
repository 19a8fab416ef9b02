//! Ingestion counters.
//!
//! Lock-free atomic counters updated by every message task, with a
//! point-in-time [`IngestSnapshot`] for display.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running totals for the listener.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    received: AtomicU64,
    processed: AtomicU64,
    duplicates: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    acks_sent: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_skipped(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ack_sent(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSnapshot {
    /// Messages taken off the transport.
    pub received: u64,
    /// Messages fully applied and acknowledged.
    pub processed: u64,
    /// Messages skipped as already seen (deduplication enabled only).
    pub duplicates: u64,
    /// Malformed messages.
    pub rejected: u64,
    /// Messages abandoned on a store or publish failure.
    pub failed: u64,
    /// Acknowledgements published.
    pub acks_sent: u64,
}

impl IngestSnapshot {
    /// Messages that reached a final outcome.
    pub fn completed(&self) -> u64 {
        self.processed + self.duplicates + self.rejected + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = IngestMetrics::new();
        metrics.message_received();
        metrics.message_received();
        metrics.message_received();
        metrics.message_processed();
        metrics.ack_sent();
        metrics.message_rejected();
        metrics.message_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 3);
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.acks_sent, 1);
        assert_eq!(snapshot.completed(), 3);
    }
}
