//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Messages that respect the quiet and debug flags
//!
//! Diagnostics for developers go through `tracing`; this module is only for
//! what a person running the CLI is meant to read.

pub mod output;
