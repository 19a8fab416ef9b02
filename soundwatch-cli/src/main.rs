//! SoundWatch CLI - command-line interface
//!
//! Replays recorded detection events through the ingestion pipeline and
//! inspects configuration.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "soundwatch", version = soundwatch::VERSION)]
#[command(about = "Acoustic sensor ingestion and sound-source tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Feed a JSON-lines file of detection events through the pipeline
    Replay {
        /// File with one detection event per line
        file: PathBuf,

        /// Drive the clock from each event's timestamp
        #[arg(long)]
        event_time: bool,

        /// Read this configuration file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Replay {
            file,
            event_time,
            config,
        } => commands::replay::run(ReplayArgs {
            file,
            event_time,
            config,
        }),
        Commands::Config(command) => commands::config::run(command),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.exit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from(["soundwatch", "replay", "events.jsonl", "--event-time"])
            .unwrap();
        match cli.command {
            Commands::Replay {
                file, event_time, ..
            } => {
                assert_eq!(file, PathBuf::from("events.jsonl"));
                assert!(event_time);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
