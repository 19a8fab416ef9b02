//! Configuration file support.
//!
//! Settings live in an INI file, by default `~/.soundwatch/config.ini`.
//! Every key is optional; a missing file or section yields the defaults.
//!
//! ```ini
//! [broker]
//! topic_prefix = sound_monitoring/sensor
//!
//! [tracking]
//! retention_secs = 600
//! max_samples = 100
//! speed_threshold_mps = 1.0
//! prediction_horizon_secs = 1800
//!
//! [ingest]
//! max_in_flight = 64
//! deduplicate = false
//!
//! [logging]
//! level = info
//! directory =
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::bus::{TopicScheme, DEFAULT_TOPIC_PREFIX};
use crate::ingest::{IngestConfig, DEFAULT_MAX_IN_FLIGHT};
use crate::logging::LoggingConfig;
use crate::tracking::{
    TrackingConfig, DEFAULT_MAX_SAMPLES, DEFAULT_PREDICTION_HORIZON, DEFAULT_RETENTION,
    DEFAULT_SPEED_THRESHOLD_MPS,
};

/// Directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".soundwatch";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

const BROKER: &str = "broker";
const TRACKING: &str = "tracking";
const INGEST: &str = "ingest";
const LOGGING: &str = "logging";

/// Errors from loading or interpreting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Could not determine home directory")]
    NoConfigDir,
}

/// Directory holding the configuration file.
pub fn config_directory() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

/// Default configuration file path.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// `[broker]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub topic_prefix: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

/// `[tracking]` settings, in file units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    pub retention_secs: u64,
    pub max_samples: usize,
    pub speed_threshold_mps: f64,
    pub prediction_horizon_secs: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            retention_secs: DEFAULT_RETENTION.as_secs(),
            max_samples: DEFAULT_MAX_SAMPLES,
            speed_threshold_mps: DEFAULT_SPEED_THRESHOLD_MPS,
            prediction_horizon_secs: DEFAULT_PREDICTION_HORIZON.as_secs(),
        }
    }
}

/// `[ingest]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub max_in_flight: usize,
    pub deduplicate: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            deduplicate: false,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub broker: BrokerSettings,
    pub tracking: TrackingSettings,
    pub ingest: IngestSettings,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default path, or return defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(BROKER)) {
            if let Some(prefix) = section.get("topic_prefix") {
                let prefix = prefix.trim();
                if prefix.is_empty() || prefix.contains(|c: char| c == '+' || c == '#') {
                    return Err(invalid(BROKER, "topic_prefix", prefix));
                }
                config.broker.topic_prefix = prefix.to_string();
            }
        }

        if let Some(section) = ini.section(Some(TRACKING)) {
            let tracking = &mut config.tracking;
            if let Some(v) = parse_value::<u64>(section, TRACKING, "retention_secs")? {
                tracking.retention_secs = v;
            }
            if let Some(v) = parse_value::<usize>(section, TRACKING, "max_samples")? {
                if v == 0 {
                    return Err(invalid(TRACKING, "max_samples", v));
                }
                tracking.max_samples = v;
            }
            if let Some(v) = parse_value::<f64>(section, TRACKING, "speed_threshold_mps")? {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(TRACKING, "speed_threshold_mps", v));
                }
                tracking.speed_threshold_mps = v;
            }
            if let Some(v) = parse_value::<u64>(section, TRACKING, "prediction_horizon_secs")? {
                tracking.prediction_horizon_secs = v;
            }
        }

        if let Some(section) = ini.section(Some(INGEST)) {
            if let Some(v) = parse_value::<usize>(section, INGEST, "max_in_flight")? {
                if v == 0 {
                    return Err(invalid(INGEST, "max_in_flight", v));
                }
                config.ingest.max_in_flight = v;
            }
            if let Some(raw) = section.get("deduplicate") {
                config.ingest.deduplicate =
                    parse_bool(raw).ok_or_else(|| invalid(INGEST, "deduplicate", raw))?;
            }
        }

        if let Some(section) = ini.section(Some(LOGGING)) {
            if let Some(level) = section.get("level") {
                let level = level.trim();
                if level.is_empty() || EnvFilter::try_new(level).is_err() {
                    return Err(invalid(LOGGING, "level", level));
                }
                config.logging.level = level.to_string();
            }
            if let Some(dir) = section.get("directory") {
                let dir = dir.trim();
                config.logging.directory = (!dir.is_empty()).then(|| PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    /// Render the effective configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new();
        ini.with_section(Some(BROKER))
            .set("topic_prefix", self.broker.topic_prefix.as_str());
        ini.with_section(Some(TRACKING))
            .set("retention_secs", self.tracking.retention_secs.to_string())
            .set("max_samples", self.tracking.max_samples.to_string())
            .set(
                "speed_threshold_mps",
                self.tracking.speed_threshold_mps.to_string(),
            )
            .set(
                "prediction_horizon_secs",
                self.tracking.prediction_horizon_secs.to_string(),
            );
        ini.with_section(Some(INGEST))
            .set("max_in_flight", self.ingest.max_in_flight.to_string())
            .set("deduplicate", self.ingest.deduplicate.to_string());
        ini.with_section(Some(LOGGING))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            );

        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ini.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig::default()
            .with_retention(Duration::from_secs(self.tracking.retention_secs))
            .with_max_samples(self.tracking.max_samples)
            .with_speed_threshold(self.tracking.speed_threshold_mps)
            .with_prediction_horizon(Duration::from_secs(self.tracking.prediction_horizon_secs))
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig::default()
            .with_max_in_flight(self.ingest.max_in_flight)
            .with_deduplicate(self.ingest.deduplicate)
    }

    pub fn topic_scheme(&self) -> TopicScheme {
        TopicScheme::new(&self.broker.topic_prefix)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        self.logging.clone()
    }
}

fn invalid(section: &str, key: &str, value: impl Display) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(name, key, raw)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.tracking_config(), TrackingConfig::default());
        assert_eq!(config.ingest_config(), IngestConfig::default());
        assert_eq!(config.topic_scheme(), TopicScheme::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_full_file() {
        let config = ConfigFile::parse(
            r#"
[broker]
topic_prefix = field/array

[tracking]
retention_secs = 120
max_samples = 10
speed_threshold_mps = 2.5
prediction_horizon_secs = 60

[ingest]
max_in_flight = 4
deduplicate = yes

[logging]
level = soundwatch=debug
directory = /var/log/soundwatch
"#,
        )
        .unwrap();

        let tracking = config.tracking_config();
        assert_eq!(tracking.retention_millis(), 120_000);
        assert_eq!(tracking.max_samples, 10);
        assert_eq!(tracking.speed_threshold_mps, 2.5);
        assert_eq!(tracking.prediction_horizon, Duration::from_secs(60));

        let ingest = config.ingest_config();
        assert_eq!(ingest.max_in_flight, 4);
        assert!(ingest.deduplicate);

        assert_eq!(config.topic_scheme().ack_topic("s1"), "field/array/s1/ack");
        assert_eq!(config.logging.level, "soundwatch=debug");
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/var/log/soundwatch"))
        );
    }

    #[test]
    fn test_empty_directory_means_stderr_only() {
        let config = ConfigFile::parse("[logging]\ndirectory =\n").unwrap();
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("[tracking]\nmax_samples = 0\n", "max_samples"),
            ("[tracking]\nretention_secs = soon\n", "retention_secs"),
            ("[tracking]\nspeed_threshold_mps = -1\n", "speed_threshold_mps"),
            ("[ingest]\ndeduplicate = maybe\n", "deduplicate"),
            ("[ingest]\nmax_in_flight = 0\n", "max_in_flight"),
            ("[broker]\ntopic_prefix = a/+/b\n", "topic_prefix"),
        ];

        for (text, expected_key) in cases {
            match ConfigFile::parse(text) {
                Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("expected InvalidValue for {expected_key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\nmax_in_flight = 8").unwrap();

        let config = ConfigFile::load_from(file.path()).unwrap();
        assert_eq!(config.ingest.max_in_flight, 8);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigFile::load_from(&dir.path().join("absent.ini"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_rendered_ini_parses_back() {
        let mut config = ConfigFile::default();
        config.ingest.deduplicate = true;
        config.tracking.max_samples = 5;

        let text = config.to_ini_string();
        assert!(text.contains("[tracking]"));
        assert_eq!(ConfigFile::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_config_file_path_ends_with_name() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with(".soundwatch/config.ini"));
        }
    }
}
