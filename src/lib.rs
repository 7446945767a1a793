//! Core library for the `steer` CLI: resumable, codebase-aware task workflows.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod impact;
pub mod map;
pub mod paths;
pub mod ports;
pub mod store;
pub mod workflow;

#[cfg(test)]
mod test_support;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use error::{Result, SteerError};

/// Installs the stderr log subscriber. `RUST_LOG` overrides the level.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    init_tracing(cli.verbose);
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_prints_help() {
        assert!(run(["steer", "--help"]).is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        assert!(run(["steer", "unknown"]).is_err());
    }

    #[test]
    fn run_reports_status_for_an_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        assert!(run(["steer", "--root", root, "status"]).is_ok());
    }
}
