//! Logging setup.
//!
//! Installs a `tracing` subscriber that writes to stderr and, when a
//! directory is configured, to a daily rolling file. `RUST_LOG` takes
//! precedence over the configured level.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when neither the config nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix for rolled log files.
pub const LOG_FILE_PREFIX: &str = "soundwatch.log";

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level or filter directive, e.g. `info` or `soundwatch=debug`.
    pub level: String,
    /// Directory for rolling log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Filter from `RUST_LOG`, falling back to the configured level.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled; keep it
/// alive for the life of the program or buffered lines are lost. Calling
/// this a second time leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(config.filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    guard
}
