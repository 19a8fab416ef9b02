//! Wall-clock abstraction.
//!
//! Eviction and arrival estimates are computed relative to "now". Production
//! code reads the system clock; tests and replays drive a [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};

use crate::model::EpochMillis;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> EpochMillis;
}

/// System UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> EpochMillis {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: EpochMillis) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: EpochMillis) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> EpochMillis {
        self.now.load(Ordering::SeqCst)
    }
}
