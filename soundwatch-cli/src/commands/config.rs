//! Configuration CLI commands.
//!
//! Provides `config show` and `config path`.

use std::path::PathBuf;

use clap::Subcommand;
use soundwatch::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show {
        /// Read this file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show { config } => run_show(config),
        ConfigCommands::Path => run_path(),
    }
}

/// Load the configuration from `path`, or from the default location.
pub fn load(path: Option<&PathBuf>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

fn run_show(path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load(path.as_ref())?;
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broker]\ntopic_prefix = lab/mics").unwrap();

        let config = load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.broker.topic_prefix, "lab/mics");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(&dir.path().join("missing.ini")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
