//! persistgql - Persisted-query manifests for GraphQL build pipelines
//!
//! persistgql collects every GraphQL operation a build references, reduces
//! each to a canonical printed form, hashes it, and publishes a sorted
//! manifest mapping operation text to hash. A server can then accept a hash
//! in place of the full query.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, drives a build)
//! - [`plugin`] - Build-tool hooks and the producer/consumer link
//! - [`coordinator`] - Publication record, subscribers, and the resolution gate
//! - [`build`] - Build passes, aggregation, and manifest generation
//! - [`core`] - Hashing, normalization, manifest and config types
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! persistgql maintains the following invariants:
//!
//! 1. The same corpus always yields the byte-identical manifest
//! 2. Every manifest value is the hash of its own key
//! 3. Consumers never resolve the manifest module before one exists
//! 4. A failed build never replaces a published manifest

pub mod build;
pub mod cli;
pub mod coordinator;
pub mod core;
pub mod plugin;
pub mod ui;
