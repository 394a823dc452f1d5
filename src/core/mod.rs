//! core
//!
//! Core domain types and pure operations for persistgql.
//!
//! # Modules
//!
//! - [`types`] - Strong types: QueryHash
//! - [`normalize`] - Parse and split GraphQL documents into operations
//! - [`print`] - Canonical printer for the split documents
//! - [`manifest`] - The sorted operation-to-hash mapping and its JSON form
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid hashes from reaching a manifest
//! - Schemas are strict and self-describing
//! - Everything here is deterministic and free of shared state

pub mod config;
pub mod manifest;
pub mod normalize;
pub mod print;
pub mod types;
