//! CLI error type.

use std::fmt;
use std::process::ExitCode;

use soundwatch::config::ConfigError;
use thiserror::Error;

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl CliError {
    /// Wrap any displayable failure as a runtime error.
    pub fn runtime(e: impl fmt::Display) -> Self {
        CliError::Runtime(e.to_string())
    }

    /// Print the error and map it to a process exit code.
    pub fn exit(&self) -> ExitCode {
        eprintln!("Error: {}", self);
        match self {
            CliError::Config(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::NoConfigDir.into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Could not determine home directory"
        );
    }
}
