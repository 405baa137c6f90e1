//! cli
//!
//! Command-line interface layer for branchfmt.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Errors travel up as `anyhow::Error`;
//! `main` prints them and any hint found in the chain.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::engine::{self, EngineError};
use crate::format::FormatError;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BRANCHFMT_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Usage errors exit 1;
/// `--help` and `--version` exit 0.
pub fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Printing only fails when the terminal is gone.
            let _ = err.print();
            return Ok(match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    };

    init_logging(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
    };

    tracing::debug!(command = cli.command.name(), "dispatching");
    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber.
///
/// `--debug` turns on debug output for branchfmt; otherwise the filter comes
/// from `BRANCHFMT_LOG`, defaulting to warnings only.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("branchfmt=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Find a remedy for `err` anywhere in its cause chain.
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            engine.hint()
        } else {
            cause
                .downcast_ref::<FormatError>()
                .and_then(engine::format_hint)
        }
    })
}
