//! core::manifest
//!
//! The persisted-query manifest: canonical operation text mapped to its hash.
//!
//! # Ordering
//!
//! Entries are kept sorted by key (Unicode scalar value order). Sorting is a
//! correctness property: it makes the serialized manifest byte-stable across
//! builds, so the artifact can be diffed and reproduced.
//!
//! # Serialized Form
//!
//! The canonical serialization is compact JSON with keys in sorted order:
//!
//! ```text
//! {"query a {\n  x\n}\n":"<40-hex>","query b {\n  y\n}\n":"<40-hex>"}
//! ```
//!
//! # Example
//!
//! ```
//! use persistgql::core::manifest::Manifest;
//!
//! let manifest = Manifest::from_keys(vec!["query b {\n  y\n}\n".to_string(), "query a {\n  x\n}\n".to_string()]);
//! let keys: Vec<&str> = manifest.keys().collect();
//! assert_eq!(keys, vec!["query a {\n  x\n}\n", "query b {\n  y\n}\n"]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::QueryHash;

/// Source of the manifest module before any manifest has been published.
pub const EMPTY_MODULE_SOURCE: &str = "module.exports = {};";

/// Sorted mapping from canonical operation text to its content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, QueryHash>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest by hashing every key.
    ///
    /// Duplicate keys collapse into one entry.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let entries = keys
            .into_iter()
            .map(|key| {
                let hash = QueryHash::compute(&key);
                (key, hash)
            })
            .collect();
        Self { entries }
    }

    /// Parse a manifest from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is not a valid hash.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to the canonical compact JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    /// Number of operations in the manifest.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the manifest has no operations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the hash of an operation text.
    pub fn get(&self, key: &str) -> Option<&QueryHash> {
        self.entries.get(key)
    }

    /// Check whether an operation text is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Operation texts in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryHash)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check that every value is the hash of its key.
    pub fn is_consistent(&self) -> bool {
        self.entries
            .iter()
            .all(|(key, hash)| QueryHash::compute(key) == *hash)
    }
}

/// Render the manifest module source for a serialized manifest.
///
/// ```
/// use persistgql::core::manifest::module_source;
///
/// assert_eq!(module_source("{}"), "module.exports = {};");
/// ```
pub fn module_source(json: &str) -> String {
    format!("module.exports = {};", json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT_UPDATED: &str = "query countUpdated {\n  amount\n}\n";
    const GET_COUNT: &str = "query getCount {\n  count {\n    amount\n  }\n}\n";

    mod construction {
        use super::*;

        #[test]
        fn empty_manifest() {
            let manifest = Manifest::new();
            assert!(manifest.is_empty());
            assert_eq!(manifest.to_json().unwrap(), "{}");
        }

        #[test]
        fn keys_sorted_regardless_of_input_order() {
            let manifest = Manifest::from_keys(vec![
                "query z { a }".to_string(),
                "mutation m { a }".to_string(),
                "query a { a }".to_string(),
            ]);
            let keys: Vec<_> = manifest.keys().collect();
            assert_eq!(keys, vec!["mutation m { a }", "query a { a }", "query z { a }"]);
        }

        #[test]
        fn duplicate_keys_collapse() {
            let manifest = Manifest::from_keys(vec!["x".to_string(), "x".to_string()]);
            assert_eq!(manifest.len(), 1);
        }

        #[test]
        fn values_are_hashes_of_keys() {
            let manifest = Manifest::from_keys(vec![GET_COUNT.to_string()]);
            assert_eq!(
                manifest.get(GET_COUNT).unwrap().as_str(),
                "f0b1fc6be73d03f4ca8b5cf34c1f7ae164b8ef57"
            );
            assert!(manifest.is_consistent());
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn canonical_json() {
            let manifest =
                Manifest::from_keys(vec![GET_COUNT.to_string(), COUNT_UPDATED.to_string()]);
            assert_eq!(
                manifest.to_json().unwrap(),
                "{\"query countUpdated {\\n  amount\\n}\\n\":\"c3808f06ccac00fa81fb0eb42ebad1ce5405cc30\",\
                 \"query getCount {\\n  count {\\n    amount\\n  }\\n}\\n\":\"f0b1fc6be73d03f4ca8b5cf34c1f7ae164b8ef57\"}"
            );
        }

        #[test]
        fn json_stable_across_builds() {
            let first = Manifest::from_keys(vec![GET_COUNT.to_string(), COUNT_UPDATED.to_string()]);
            let second =
                Manifest::from_keys(vec![COUNT_UPDATED.to_string(), GET_COUNT.to_string()]);
            assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        }

        #[test]
        fn parses_back() {
            let manifest = Manifest::from_keys(vec![GET_COUNT.to_string()]);
            let parsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
            assert_eq!(parsed, manifest);
        }

        #[test]
        fn rejects_invalid_hash_values() {
            assert!(Manifest::from_json("{\"query a { b }\":\"nope\"}").is_err());
        }

        #[test]
        fn module_source_wraps_json() {
            assert_eq!(module_source("{\"a\":\"b\"}"), "module.exports = {\"a\":\"b\"};");
            assert_eq!(module_source("{}"), EMPTY_MODULE_SOURCE);
        }
    }
}
