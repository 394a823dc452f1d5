//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! A project carries a single `persistgql.toml` describing where the
//! manifest module lives, which asset name the manifest is emitted under,
//! and whether typename injection is enabled.
//!
//! # Precedence
//!
//! The first file found wins:
//! 1. Explicit path (e.g. `--config`)
//! 2. `$PERSISTGQL_CONFIG` if set
//! 3. `<project>/persistgql.toml` (canonical)
//! 4. `<project>/.persistgql.toml` (compatibility, warns)
//!
//! CLI flags override values from the file; that merge happens in the CLI.
//!
//! # Example
//!
//! ```no_run
//! use persistgql::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Path::new("/path/to/project"), None).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//! println!("typename: {}", result.config.manifest.add_typename());
//! ```

pub mod schema;

pub use schema::ManifestConfig;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PERSISTGQL_CONFIG";

/// Canonical config file name.
pub const CONFIG_FILE: &str = "persistgql.toml";

/// Compatibility config file name.
const COMPAT_CONFIG_FILE: &str = ".persistgql.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("module_name is required")]
    MissingModuleName,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Manifest settings.
    pub manifest: ManifestConfig,
    /// Path to the config file (if one was loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration for a project directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. Missing config files are not an error (defaults are used).
    pub fn load(
        project_dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(project_dir, explicit, from_env.as_deref())
    }

    fn load_from(
        project_dir: &Path,
        explicit: Option<&Path>,
        from_env: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let found = Self::locate(project_dir, explicit, from_env, &mut warnings);

        let (manifest, path) = match found {
            Some(path) => (Self::read_config(&path)?, Some(path)),
            None => (ManifestConfig::default(), None),
        };

        manifest.validate()?;

        tracing::debug!(path = ?path, "loaded configuration");
        Ok(ConfigLoadResult {
            config: Config { manifest, path },
            warnings,
        })
    }

    fn locate(
        project_dir: &Path,
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Option<PathBuf> {
        // An explicit path is returned even if missing so the read reports it.
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(path) = from_env {
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        let canonical = Self::config_path(project_dir);
        if canonical.exists() {
            return Some(canonical);
        }

        let compat = project_dir.join(COMPAT_CONFIG_FILE);
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please rename to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            return Some(compat);
        }

        None
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ManifestConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical config path for a project directory.
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    /// Write project config atomically.
    ///
    /// Uses atomic write (write to temp file, then rename) to prevent corruption.
    pub fn write(project_dir: &Path, config: &ManifestConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::config_path(project_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    fn write_config_atomic(path: &Path, config: &ManifestConfig) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
