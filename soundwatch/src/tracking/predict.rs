//! Arrival-time prediction.
//!
//! Given the position where a sound was just heard and the speed of its
//! track, estimates when the source would reach each other sensor if it
//! headed straight there. Only sensors reachable within the horizon are
//! reported, soonest first.

use std::time::Duration;

use crate::geo::{self, GeoPoint};
use crate::model::{EpochMillis, Prediction, SensorRecord};

/// Rank sensors by estimated arrival time.
///
/// # Arguments
///
/// * `origin` - Location of the triggering event
/// * `speed_mps` - Track speed; non-positive speed yields no predictions
/// * `now` - Reference time for the estimates
/// * `reporting_sensor` - Sensor that reported the event (never predicted)
/// * `sensors` - Candidate sensors with their last known locations
/// * `horizon` - Maximum time-to-arrival (exclusive)
pub fn predict_arrivals<'a>(
    origin: GeoPoint,
    speed_mps: f64,
    now: EpochMillis,
    reporting_sensor: &str,
    sensors: impl IntoIterator<Item = &'a SensorRecord>,
    horizon: Duration,
) -> Vec<Prediction> {
    if speed_mps <= 0.0 || speed_mps.is_nan() {
        return Vec::new();
    }

    let horizon_secs = horizon.as_secs_f64();
    let mut predictions: Vec<Prediction> = sensors
        .into_iter()
        .filter(|sensor| sensor.sensor_id != reporting_sensor)
        .filter_map(|sensor| {
            let time_to_arrival = geo::distance(origin, sensor.location) / speed_mps;
            (time_to_arrival < horizon_secs).then(|| Prediction {
                sensor_id: sensor.sensor_id.clone(),
                estimated_arrival_time: now.saturating_add((time_to_arrival * 1000.0) as i64),
            })
        })
        .collect();

    predictions.sort_by_key(|p| p.estimated_arrival_time);
    predictions
}
