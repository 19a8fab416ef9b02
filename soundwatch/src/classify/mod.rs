//! Sound-type classification.
//!
//! Maps free-form sound labels reported by sensors onto a small set of coarse
//! categories, and converts detector confidence into a bounded intensity
//! score. Both functions are pure and infallible.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the intensity scale.
pub const MAX_INTENSITY: f64 = 10.0;

/// Coarse classification of a sound-type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    /// Airborne sources (drones, quadcopters).
    Air,
    /// Emergency vehicles and alarms.
    Emergency,
    /// Ground-level machinery.
    Ground,
    /// Anything not covered by the keyword table.
    Other,
}

impl SoundCategory {
    /// Lower-case name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCategory::Air => "air",
            SoundCategory::Emergency => "emergency",
            SoundCategory::Ground => "ground",
            SoundCategory::Other => "other",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keyword table. First match wins, so more specific keywords that
/// overlap a shorter one must come first.
const KEYWORDS: &[(&str, SoundCategory)] = &[
    ("drone", SoundCategory::Air),
    ("quadcopter", SoundCategory::Air),
    ("siren", SoundCategory::Emergency),
    ("chainsaw", SoundCategory::Ground),
];

/// Classify a sound-type label by case-insensitive substring match.
pub fn categorize(label: &str) -> SoundCategory {
    let label = label.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(SoundCategory::Other)
}

/// Scale a detector confidence into `[0, 10]`.
///
/// The raw confidence is divided by ten and clamped. NaN maps to 0.
pub fn intensity(confidence: f64) -> f64 {
    let scaled = confidence / 10.0;
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(0.0, MAX_INTENSITY)
}
