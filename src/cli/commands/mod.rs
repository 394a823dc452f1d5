//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and merges command-line overrides
//! 2. Calls into the library to do the work
//! 3. Formats and displays output

mod build;
mod hash;
mod init;

// Re-export command functions for testing and direct invocation
pub use build::{build, collect_graphql_files};
pub use hash::hash;
pub use init::init;

use super::args::Command;
use super::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Build {
            paths,
            module_name,
            add_typename,
            output,
            check,
        } => build::build(
            ctx,
            &paths,
            module_name.as_deref(),
            add_typename,
            output.as_deref(),
            check,
        ),
        Command::Hash { text, file } => hash::hash(ctx, text.as_deref(), file.as_deref()),
        Command::Init {
            module_name,
            filename,
            add_typename,
            force,
        } => init::init(ctx, &module_name, filename.as_deref(), add_typename, force),
    }
}
