//! Tracking engine configuration.

use std::time::Duration;

/// Default age limit for retained samples (10 minutes).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Default maximum samples per track.
pub const DEFAULT_MAX_SAMPLES: usize = 100;

/// Default speed above which predictions are recomputed (m/s).
pub const DEFAULT_SPEED_THRESHOLD_MPS: f64 = 1.0;

/// Default horizon for arrival predictions (30 minutes).
pub const DEFAULT_PREDICTION_HORIZON: Duration = Duration::from_secs(30 * 60);

/// Configuration for track maintenance and arrival prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Samples older than this relative to "now" are evicted.
    pub retention: Duration,
    /// Maximum samples retained per track (oldest dropped first).
    pub max_samples: usize,
    /// Predictions are recomputed only when speed exceeds this (m/s).
    pub speed_threshold_mps: f64,
    /// Sensors further away than this in travel time are not predicted.
    pub prediction_horizon: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            max_samples: DEFAULT_MAX_SAMPLES,
            speed_threshold_mps: DEFAULT_SPEED_THRESHOLD_MPS,
            prediction_horizon: DEFAULT_PREDICTION_HORIZON,
        }
    }
}

impl TrackingConfig {
    /// Retention window in milliseconds.
    pub fn retention_millis(&self) -> i64 {
        self.retention.as_millis() as i64
    }

    /// Set the retention window.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the sample cap.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Set the motion threshold.
    pub fn with_speed_threshold(mut self, mps: f64) -> Self {
        self.speed_threshold_mps = mps;
        self
    }

    /// Set the prediction horizon.
    pub fn with_prediction_horizon(mut self, horizon: Duration) -> Self {
        self.prediction_horizon = horizon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackingConfig::default();
        assert_eq!(config.retention_millis(), 600_000);
        assert_eq!(config.max_samples, 100);
        assert_eq!(config.speed_threshold_mps, 1.0);
        assert_eq!(config.prediction_horizon, Duration::from_secs(1800));
    }

    #[test]
    fn test_builder() {
        let config = TrackingConfig::default()
            .with_retention(Duration::from_secs(60))
            .with_max_samples(5)
            .with_speed_threshold(2.5)
            .with_prediction_horizon(Duration::from_secs(90));

        assert_eq!(config.retention_millis(), 60_000);
        assert_eq!(config.max_samples, 5);
        assert_eq!(config.speed_threshold_mps, 2.5);
        assert_eq!(config.prediction_horizon, Duration::from_secs(90));
    }
}
