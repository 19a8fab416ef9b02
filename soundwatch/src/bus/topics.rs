//! Topic naming and wildcard matching.
//!
//! Topics are `/`-separated levels. Subscription patterns may use `+` to
//! match exactly one level and a trailing `#` to match any number of
//! remaining levels (including none).

/// Default prefix under which sensors publish.
pub const DEFAULT_TOPIC_PREFIX: &str = "sound_monitoring/sensor";

const ALERT_LEVEL: &str = "alert";
const ACK_LEVEL: &str = "ack";

/// Builds the per-sensor topics used by the listener.
///
/// With the default prefix:
/// - alerts arrive on `sound_monitoring/sensor/{sensor_id}/alert`
/// - acks are sent to `sound_monitoring/sensor/{sensor_id}/ack`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    prefix: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}

impl TopicScheme {
    /// Create a scheme rooted at `prefix` (trailing `/` is ignored).
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pattern matching every sensor's alert topic.
    pub fn alert_subscription(&self) -> String {
        format!("{}/+/{}", self.prefix, ALERT_LEVEL)
    }

    /// Alert topic for one sensor.
    pub fn alert_topic(&self, sensor_id: &str) -> String {
        format!("{}/{}/{}", self.prefix, sensor_id, ALERT_LEVEL)
    }

    /// Acknowledgement topic for one sensor.
    pub fn ack_topic(&self, sensor_id: &str) -> String {
        format!("{}/{}/{}", self.prefix, sensor_id, ACK_LEVEL)
    }

    /// Extract the sensor id segment from an alert topic.
    ///
    /// Returns `None` if `topic` is not an alert topic under this prefix.
    pub fn sensor_id_from_alert_topic<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let rest = topic.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?;
        let sensor_id = rest.strip_suffix(ALERT_LEVEL)?.strip_suffix('/')?;
        if sensor_id.is_empty() || sensor_id.contains('/') {
            return None;
        }
        Some(sensor_id)
    }
}

/// Check whether a concrete topic matches a subscription pattern.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_levels = pattern.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(p), Some(t)) if p == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// A topic is publishable if it is non-empty and contains no wildcards.
pub fn is_valid_publish_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(|c: char| c == '+' || c == '#')
}
