//! cli
//!
//! Command-line interface layer for persistgql.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the logging subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It turns files on disk into a [`crate::build::BuildPass`]
//! and drives a standalone [`crate::plugin::PersistPlugin`] through the same
//! hooks a host build tool would call.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Explicit config file.
    pub config: Option<PathBuf>,
}

impl Context {
    /// Directory the command runs in.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        config: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the global tracing subscriber.
///
/// `--debug` forces the `debug` level; otherwise `RUST_LOG` applies, falling
/// back to `warn`. Logs go to stderr so manifest output on stdout stays clean.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when run() is called twice in-process.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
