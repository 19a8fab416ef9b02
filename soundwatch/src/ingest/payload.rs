//! Wire payload parsing and enrichment.
//!
//! Sensors publish a JSON document per detection:
//!
//! ```json
//! {
//!   "message_id": "a1b2",
//!   "sensor_id": "mic-07",
//!   "location": {"latitude": 50.45, "longitude": 30.52},
//!   "timestamp": 1718000000000,
//!   "sound_type": "Drone-X200",
//!   "confidence": 87.5,
//!   "first_timestamp": 1717999990000
//! }
//! ```
//!
//! Every field except `first_timestamp` is required. Unknown fields are
//! ignored.

use serde::Deserialize;

use super::error::ParseError;
use crate::classify::{categorize, intensity};
use crate::geo::GeoPoint;
use crate::model::{DetectionEvent, EpochMillis};

/// Wire shape with every field optional, so that absence can be reported by
/// name instead of as a generic decode error.
#[derive(Debug, Deserialize)]
struct RawDetection {
    message_id: Option<String>,
    sensor_id: Option<String>,
    location: Option<GeoPoint>,
    timestamp: Option<EpochMillis>,
    sound_type: Option<String>,
    confidence: Option<f64>,
    first_timestamp: Option<EpochMillis>,
}

/// A structurally valid detection, not yet enriched.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPayload {
    pub message_id: String,
    pub sensor_id: String,
    pub location: GeoPoint,
    pub timestamp: EpochMillis,
    pub sound_type: String,
    pub confidence: f64,
    pub first_timestamp: Option<EpochMillis>,
}

impl DetectionPayload {
    /// Parse and validate a raw message body.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let raw: RawDetection = serde_json::from_slice(bytes)?;

        Ok(Self {
            message_id: required_text(raw.message_id, "message_id")?,
            sensor_id: required_text(raw.sensor_id, "sensor_id")?,
            location: raw.location.ok_or(ParseError::MissingField("location"))?,
            timestamp: raw.timestamp.ok_or(ParseError::MissingField("timestamp"))?,
            sound_type: required_text(raw.sound_type, "sound_type")?,
            confidence: raw.confidence.ok_or(ParseError::MissingField("confidence"))?,
            first_timestamp: raw.first_timestamp,
        })
    }

    /// Classify and stamp the payload, producing the stored event.
    pub fn enrich(self, now: EpochMillis) -> DetectionEvent {
        DetectionEvent {
            category: categorize(&self.sound_type),
            intensity: intensity(self.confidence),
            first_timestamp: self.first_timestamp.unwrap_or(self.timestamp),
            processed_at: now,
            message_id: self.message_id,
            sensor_id: self.sensor_id,
            location: self.location,
            timestamp: self.timestamp,
            sound_type: self.sound_type,
            confidence: self.confidence,
        }
    }
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ParseError> {
    match value {
        None => Err(ParseError::MissingField(field)),
        Some(v) if v.trim().is_empty() => Err(ParseError::EmptyField(field)),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SoundCategory;
    use serde_json::json;

    fn valid() -> serde_json::Value {
        json!({
            "message_id": "m-1",
            "sensor_id": "s-1",
            "location": {"latitude": 50.0, "longitude": 30.0},
            "timestamp": 1_000,
            "sound_type": "Drone-X200",
            "confidence": 45
        })
    }

    fn parse(value: &serde_json::Value) -> Result<DetectionPayload, ParseError> {
        DetectionPayload::parse(&serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn test_parse_valid() {
        let payload = parse(&valid()).unwrap();
        assert_eq!(payload.sensor_id, "s-1");
        assert_eq!(payload.location, GeoPoint::new(50.0, 30.0));
        assert_eq!(payload.confidence, 45.0);
        assert_eq!(payload.first_timestamp, None);
    }

    #[test]
    fn test_each_required_field() {
        for field in [
            "message_id",
            "sensor_id",
            "location",
            "timestamp",
            "sound_type",
            "confidence",
        ] {
            let mut value = valid();
            value.as_object_mut().unwrap().remove(field);
            match parse(&value) {
                Err(ParseError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("expected MissingField({}), got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_null_counts_as_missing() {
        let mut value = valid();
        value["sensor_id"] = serde_json::Value::Null;
        assert!(matches!(
            parse(&value),
            Err(ParseError::MissingField("sensor_id"))
        ));
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut value = valid();
        value["message_id"] = json!("  ");
        assert!(matches!(
            parse(&value),
            Err(ParseError::EmptyField("message_id"))
        ));
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        let mut value = valid();
        value["location"] = json!("50.0,30.0");
        assert!(matches!(parse(&value), Err(ParseError::InvalidJson(_))));

        let mut value = valid();
        value["confidence"] = json!("high");
        assert!(matches!(parse(&value), Err(ParseError::InvalidJson(_))));

        let mut value = valid();
        value["location"] = json!({"latitude": 50.0});
        assert!(matches!(parse(&value), Err(ParseError::InvalidJson(_))));

        assert!(matches!(
            DetectionPayload::parse(b"not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_enrich_derives_fields() {
        let event = parse(&valid()).unwrap().enrich(9_999);
        assert_eq!(event.category, SoundCategory::Air);
        assert!((event.intensity - 4.5).abs() < f64::EPSILON);
        assert_eq!(event.processed_at, 9_999);
        assert_eq!(event.first_timestamp, 1_000);
    }

    #[test]
    fn test_enrich_keeps_first_timestamp() {
        let mut value = valid();
        value["first_timestamp"] = json!(500);
        let event = parse(&value).unwrap().enrich(0);
        assert_eq!(event.first_timestamp, 500);
    }
}
