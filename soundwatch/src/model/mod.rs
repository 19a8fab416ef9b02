//! Core documents exchanged between the listener, the tracker and the store.
//!
//! All timestamps are integer epoch milliseconds. Types serialize with the
//! same field names used on the wire and in the document store.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::SoundCategory;
use crate::geo::GeoPoint;

/// Epoch timestamp in milliseconds.
pub type EpochMillis = i64;

/// A detection event after enrichment, as persisted in the alert collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Sender-assigned message identifier.
    pub message_id: String,
    /// Reporting sensor.
    pub sensor_id: String,
    /// Where the sensor heard the sound.
    pub location: GeoPoint,
    /// Detection time as recorded by the sensor.
    pub timestamp: EpochMillis,
    /// Raw sound-type label.
    pub sound_type: String,
    /// Detector confidence as received (unbounded).
    pub confidence: f64,
    /// When the sound was first heard; defaults to `timestamp`.
    pub first_timestamp: EpochMillis,
    /// When the core processed the event.
    pub processed_at: EpochMillis,
    /// Coarse category derived from `sound_type`.
    pub category: SoundCategory,
    /// Confidence mapped into `[0, 10]`.
    pub intensity: f64,
}

impl DetectionEvent {
    /// Key of the track this event feeds (lower-cased sound type).
    pub fn track_key(&self) -> String {
        track_key(&self.sound_type)
    }

    /// The event's position and time as a track sample.
    pub fn sample(&self) -> LocationSample {
        LocationSample::new(self.location, self.timestamp)
    }
}

/// Normalize a sound-type label into a track key.
pub fn track_key(sound_type: &str) -> String {
    sound_type.to_lowercase()
}

/// Sensor liveness status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorStatus::Online => f.write_str("online"),
            SensorStatus::Offline => f.write_str("offline"),
        }
    }
}

/// Last known state of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub sensor_id: String,
    pub location: GeoPoint,
    pub last_seen: EpochMillis,
    pub status: SensorStatus,
}

impl SensorRecord {
    /// A record for a sensor that has just been heard from.
    pub fn online(sensor_id: impl Into<String>, location: GeoPoint, now: EpochMillis) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            location,
            last_seen: now,
            status: SensorStatus::Online,
        }
    }
}

/// One position of a sound source in a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: EpochMillis,
}

impl LocationSample {
    pub fn new(point: GeoPoint, timestamp: EpochMillis) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Estimated arrival of a tracked source at a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub sensor_id: String,
    pub estimated_arrival_time: EpochMillis,
}

/// Rolling movement record for one sound type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Lower-cased sound-type label (unique key).
    pub sound_type: String,
    /// Recent positions, oldest first.
    pub locations: VecDeque<LocationSample>,
    /// Last computed speed in meters per second.
    pub speed: f64,
    /// Last computed bearing in degrees, `[0, 360)`.
    pub direction: f64,
    /// Arrival estimates, soonest first.
    pub predictions: Vec<Prediction>,
}

impl Track {
    /// An empty track with no motion state.
    pub fn new(sound_type: impl Into<String>) -> Self {
        Self {
            sound_type: sound_type.into(),
            locations: VecDeque::new(),
            speed: 0.0,
            direction: 0.0,
            predictions: Vec::new(),
        }
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&LocationSample> {
        self.locations.back()
    }
}

/// Acknowledgement body published back to a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message_id: String,
    pub status: AckStatus,
}

impl Acknowledgement {
    pub fn received(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: AckStatus::Received,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Received,
}
