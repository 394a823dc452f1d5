//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--config <file>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// persistgql - Persisted-query manifests for GraphQL
#[derive(Parser, Debug)]
#[command(name = "persistgql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if persistgql was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Use this config file instead of searching for one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a manifest from GraphQL files
    #[command(
        name = "build",
        long_about = "Build a persisted-query manifest from GraphQL files.\n\n\
            Every .graphql and .gql file under the given paths is read, split into \
            one document per operation, canonically printed, and hashed. The sorted \
            manifest is written as JSON to --output, to the configured filename, or \
            to stdout.",
        after_help = "\
EXAMPLES:
    # Print the manifest for everything under src/
    persistgql build src

    # Write it next to the server and add __typename fields
    persistgql build src --add-typename --output persisted_queries.json

    # Fail in CI if the committed manifest is stale
    persistgql build src --output persisted_queries.json --check"
    )]
    Build {
        /// Files or directories to collect GraphQL from
        #[arg(value_name = "PATHS", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Path at which the manifest module is resolvable
        #[arg(long, value_name = "NAME")]
        module_name: Option<String>,

        /// Add __typename to nested selection sets before hashing
        #[arg(long)]
        add_typename: bool,

        /// Write the manifest to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fail if the output file is missing or out of date; write nothing
        #[arg(long)]
        check: bool,
    },

    /// Print the content hash of a query
    #[command(name = "hash")]
    Hash {
        /// Exact query text
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read the query text from this file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write a persistgql.toml for this project
    #[command(name = "init")]
    Init {
        /// Path at which the manifest module is resolvable
        #[arg(long, value_name = "NAME", default_value = "node_modules/persisted_queries.json")]
        module_name: String,

        /// Asset name the manifest is emitted under
        #[arg(long, value_name = "FILE")]
        filename: Option<String>,

        /// Enable typename injection
        #[arg(long)]
        add_typename: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}
