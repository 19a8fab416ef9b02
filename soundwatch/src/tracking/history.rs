//! Sample history maintenance and motion derivation for a [`Track`].
//!
//! # Design
//!
//! - Samples are kept oldest first, in arrival order (not timestamp order)
//! - Stale samples are evicted relative to "now" before anything else
//! - The sample count is capped, dropping the oldest first
//! - Speed and bearing come from the last two samples only; a non-positive
//!   interval between them leaves the previous motion state in place

use crate::geo;
use crate::model::{EpochMillis, LocationSample, Track};

use super::config::TrackingConfig;

impl Track {
    /// Apply a new sample: append, evict, cap, then derive motion.
    ///
    /// Returns true if speed and bearing were recomputed.
    pub fn record_sample(
        &mut self,
        sample: LocationSample,
        now: EpochMillis,
        config: &TrackingConfig,
    ) -> bool {
        self.locations.push_back(sample);
        self.evict_stale(now, config.retention_millis());
        self.enforce_capacity(config.max_samples);
        self.update_motion()
    }

    /// Drop every sample whose age relative to `now` exceeds `retention_ms`.
    ///
    /// Returns the number of samples removed. Samples stamped in the future
    /// have a negative age and are kept.
    pub fn evict_stale(&mut self, now: EpochMillis, retention_ms: i64) -> usize {
        let before = self.locations.len();
        self.locations
            .retain(|s| now.saturating_sub(s.timestamp) <= retention_ms);
        before - self.locations.len()
    }

    /// Keep only the newest `max_samples` samples.
    ///
    /// Returns the number of samples removed.
    pub fn enforce_capacity(&mut self, max_samples: usize) -> usize {
        let mut removed = 0;
        while self.locations.len() > max_samples {
            self.locations.pop_front();
            removed += 1;
        }
        removed
    }

    /// Recompute speed and bearing from the two most recent samples.
    ///
    /// Returns false, leaving the previous values untouched, when fewer than
    /// two samples remain or the interval between them is not positive.
    pub fn update_motion(&mut self) -> bool {
        let len = self.locations.len();
        if len < 2 {
            return false;
        }

        let prev = self.locations[len - 2];
        let curr = self.locations[len - 1];
        let elapsed_secs = curr.timestamp.saturating_sub(prev.timestamp) as f64 / 1000.0;
        if elapsed_secs <= 0.0 {
            return false;
        }

        self.speed = geo::distance(prev.point(), curr.point()) / elapsed_secs;
        self.direction = geo::bearing(prev.point(), curr.point());
        true
    }
}
