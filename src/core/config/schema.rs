//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. An explicit `--config` path
//! 2. `$PERSISTGQL_CONFIG` if set
//! 3. `<project>/persistgql.toml` (canonical)
//! 4. `<project>/.persistgql.toml` (compatibility, warns)
//!
//! # Validation
//!
//! Config values are validated after parsing. The manifest module name is
//! optional in the file but required by [`crate::plugin::PersistPlugin`];
//! that check happens when the plugin is constructed.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Manifest configuration.
///
/// # Example
///
/// ```toml
/// module_name = "node_modules/persisted_queries.json"
/// filename = "persisted_queries.json"
/// add_typename = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Path at which the manifest module is resolvable.
    pub module_name: Option<String>,

    /// Asset name the final manifest JSON is emitted under.
    pub filename: Option<String>,

    /// Add `__typename` to nested selection sets before hashing.
    pub add_typename: Option<bool>,
}

impl ManifestConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(module_name) = &self.module_name {
            if module_name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "module_name cannot be empty".into(),
                ));
            }
        }

        if let Some(filename) = &self.filename {
            if filename.trim().is_empty() {
                return Err(ConfigError::InvalidValue("filename cannot be empty".into()));
            }
        }

        Ok(())
    }

    /// Get the configured module name, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingModuleName` if no module name is set.
    pub fn require_module_name(&self) -> Result<&str, ConfigError> {
        self.module_name
            .as_deref()
            .ok_or(ConfigError::MissingModuleName)
    }

    /// Check if typename injection is enabled.
    ///
    /// Defaults to `false` if not configured.
    pub fn add_typename(&self) -> bool {
        self.add_typename.unwrap_or(false)
    }
}
