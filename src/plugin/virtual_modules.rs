//! plugin::virtual_modules
//!
//! In-memory modules that resolve as if they were files on disk.
//!
//! The host build tool reads the manifest module from here; the plugin
//! rewrites its content whenever a new manifest is published.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Store of virtual module sources keyed by path.
#[derive(Debug, Default)]
pub struct VirtualModules {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl VirtualModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a module.
    pub fn write_module(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        let contents = contents.into();
        tracing::trace!(path = %path.display(), bytes = contents.len(), "writing virtual module");
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, contents);
    }

    /// Read a module's current source.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let modules = VirtualModules::new();
        assert!(modules.is_empty());

        modules.write_module("queries.json", "module.exports = {};");
        assert!(modules.contains("queries.json"));
        assert_eq!(
            modules.read("queries.json").as_deref(),
            Some("module.exports = {};")
        );
    }

    #[test]
    fn write_replaces() {
        let modules = VirtualModules::new();
        modules.write_module("queries.json", "a");
        modules.write_module("queries.json", "b");
        assert_eq!(modules.len(), 1);
        assert_eq!(modules.read("queries.json").as_deref(), Some("b"));
    }

    #[test]
    fn missing_module_reads_none() {
        let modules = VirtualModules::new();
        assert!(modules.read("nope.json").is_none());
        assert!(!modules.contains("nope.json"));
    }
}
