//! build::builder
//!
//! Turns the modules of a sealed pass into a manifest.
//!
//! # Pipeline
//!
//! ```text
//! modules -> aggregate -> normalize -> union literals -> sort -> hash -> Manifest
//! ```
//!
//! # Invariants
//!
//! - The manifest key set is exactly the distinct rendered operations plus
//!   the distinct literal strings; nothing is dropped or merged across
//!   distinct texts
//! - The same modules always produce the same manifest
//! - A parse failure produces no manifest at all
//!
//! # Example
//!
//! ```
//! use persistgql::build::{ManifestBuilder, SourceModule, Contribution};
//!
//! let modules = vec![
//!     SourceModule::new("/app/count.graphql")
//!         .with_contribution(Contribution::Document("query getCount { count { amount } }".into())),
//! ];
//!
//! let manifest = ManifestBuilder::default().build(&modules).unwrap();
//! assert_eq!(manifest.len(), 1);
//! ```

use thiserror::Error;

use super::aggregate::{aggregate, Corpus};
use super::SourceModule;
use crate::core::config::ManifestConfig;
use crate::core::manifest::Manifest;
use crate::core::normalize::{normalize, NormalizeError, NormalizeOptions};

/// Errors from manifest generation.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The aggregated corpus failed to parse.
    #[error("manifest generation aborted: {0}")]
    Normalize(#[from] NormalizeError),
}

/// Builds manifests from pass modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestBuilder {
    options: NormalizeOptions,
}

impl ManifestBuilder {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Create a builder using the normalization settings of a config.
    pub fn from_config(config: &ManifestConfig) -> Self {
        Self::new(NormalizeOptions {
            add_typename: config.add_typename(),
        })
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Build the manifest for a set of modules.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Normalize` if the aggregated corpus does not parse.
    pub fn build<'m, I>(&self, modules: I) -> Result<Manifest, BuildError>
    where
        I: IntoIterator<Item = &'m SourceModule>,
    {
        let corpus = aggregate(modules);
        self.build_corpus(corpus)
    }

    /// Build the manifest for an already aggregated corpus.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Normalize` if the corpus source does not parse.
    pub fn build_corpus(&self, corpus: Corpus) -> Result<Manifest, BuildError> {
        let mut keys = if corpus.has_source() {
            normalize(&corpus.source, self.options)?
        } else {
            Default::default()
        };
        keys.extend(corpus.literals);

        let manifest = Manifest::from_keys(keys);
        tracing::debug!(
            modules = corpus.contributing_modules,
            operations = manifest.len(),
            add_typename = self.options.add_typename,
            "built manifest"
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Contribution;
    use std::collections::{BTreeMap, BTreeSet};

    const COUNT_UPDATED: &str = "query countUpdated {\n  amount\n}\n";
    const GET_COUNT: &str = "query getCount {\n  count {\n    amount\n  }\n}\n";

    fn document(path: &str, source: &str) -> SourceModule {
        SourceModule::new(path).with_contribution(Contribution::Document(source.into()))
    }

    fn template(path: &str, literal: &str) -> SourceModule {
        let mut map = BTreeMap::new();
        map.insert(literal.to_string(), literal.to_string());
        SourceModule::new(path).with_contribution(Contribution::Templates(map))
    }

    #[test]
    fn js_and_graphql_sources_combined() {
        let modules = vec![
            template("/app/entry.js", "query countUpdated { amount }"),
            document("/app/example.graphql", "query getCount { count { amount } }"),
        ];

        let manifest = ManifestBuilder::default().build(&modules).unwrap();

        let keys: Vec<_> = manifest.keys().collect();
        assert_eq!(keys, vec![COUNT_UPDATED, GET_COUNT]);
        assert_eq!(
            manifest.get(COUNT_UPDATED).unwrap().as_str(),
            "c3808f06ccac00fa81fb0eb42ebad1ce5405cc30"
        );
        assert_eq!(
            manifest.get(GET_COUNT).unwrap().as_str(),
            "f0b1fc6be73d03f4ca8b5cf34c1f7ae164b8ef57"
        );
    }

    #[test]
    fn no_graphql_builds_empty_manifest() {
        let modules = vec![SourceModule::new("/app/entry.js")];
        let manifest = ManifestBuilder::default().build(&modules).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn literals_used_verbatim() {
        let literals: BTreeSet<String> = ["{ raw }".to_string()].into_iter().collect();
        let modules = vec![
            SourceModule::new("/app/a.js").with_contribution(Contribution::Literals(literals)),
            document("/app/b.graphql", "query getCount { count { amount } }"),
        ];

        let manifest = ManifestBuilder::default().build(&modules).unwrap();
        assert!(manifest.contains("{ raw }"));
        assert!(manifest.contains(GET_COUNT));
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn same_name_in_two_modules_kept_distinct() {
        let modules = vec![
            document("/app/a.graphql", "query user { id }"),
            document("/app/b.graphql", "query user { name }"),
        ];
        let manifest = ManifestBuilder::default().build(&modules).unwrap();
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn typename_option_changes_keys() {
        let modules = vec![document("/app/a.graphql", "query getCount { count { amount } }")];
        let plain = ManifestBuilder::default().build(&modules).unwrap();
        let typed = ManifestBuilder::new(NormalizeOptions { add_typename: true })
            .build(&modules)
            .unwrap();
        assert_ne!(plain, typed);
        assert!(typed.keys().all(|k| k.contains("__typename")));
    }

    #[test]
    fn from_config_reads_typename_flag() {
        let config = ManifestConfig {
            add_typename: Some(true),
            ..Default::default()
        };
        assert!(ManifestBuilder::from_config(&config).options().add_typename);
        assert!(!ManifestBuilder::from_config(&ManifestConfig::default())
            .options()
            .add_typename);
    }

    #[test]
    fn parse_error_aborts_build() {
        let modules = vec![
            document("/app/good.graphql", "query a { x }"),
            document("/app/bad.graphql", "query b {"),
        ];
        let err = ManifestBuilder::default().build(&modules).unwrap_err();
        assert!(matches!(err, BuildError::Normalize(NormalizeError::Parse(_))));
    }

    #[test]
    fn deterministic_across_module_order() {
        let forward = vec![
            document("/app/a.graphql", "query a { x }"),
            document("/app/b.graphql", "query b { y }"),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();

        let builder = ManifestBuilder::default();
        assert_eq!(
            builder.build(&forward).unwrap().to_json().unwrap(),
            builder.build(&backward).unwrap().to_json().unwrap()
        );
    }
}
