//! Property-based tests for manifest generation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated corpora.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use persistgql::build::{BuildPass, Contribution, ManifestBuilder, SourceModule};
use persistgql::coordinator::Coordinator;
use persistgql::core::manifest::Manifest;
use persistgql::core::normalize::{normalize, NormalizeOptions};
use persistgql::core::types::QueryHash;

/// Strategy for GraphQL names that are not keywords.
fn name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_map(|s| format!("x_{s}"))
}

/// Strategy for a selection set of one to three fields, one level deep.
fn selection() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(name(), 1..4),
        prop::option::of((name(), prop::collection::vec(name(), 1..3))),
    )
        .prop_map(|(scalars, nested)| {
            let mut out = scalars.join(" ");
            if let Some((field, inner)) = nested {
                out.push_str(&format!(" {field} {{ {} }}", inner.join(" ")));
            }
            out
        })
}

/// Strategy for a named query operation.
fn operation() -> impl Strategy<Value = String> {
    (name(), selection()).prop_map(|(n, s)| format!("query {n} {{ {s} }}"))
}

/// Strategy for a corpus of several modules with several operations each.
fn modules() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(operation(), 0..3), 0..4)
}

fn to_source_modules(modules: &[Vec<String>]) -> Vec<SourceModule> {
    modules
        .iter()
        .enumerate()
        .map(|(i, ops)| {
            SourceModule::new(format!("/app/m{i}.graphql"))
                .with_contribution(Contribution::Document(ops.join("\n")))
        })
        .collect()
}

proptest! {
    /// The same corpus always yields byte-identical JSON.
    #[test]
    fn build_is_deterministic(mods in modules(), typename in any::<bool>()) {
        let builder = ManifestBuilder::new(NormalizeOptions { add_typename: typename });
        let source_modules = to_source_modules(&mods);

        let first = builder.build(&source_modules).unwrap().to_json().unwrap();
        let second = builder.build(&source_modules).unwrap().to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    /// Module order never changes the manifest.
    #[test]
    fn module_order_irrelevant(mods in modules()) {
        let builder = ManifestBuilder::default();
        let forward = builder.build(&to_source_modules(&mods)).unwrap();

        let mut reversed = mods.clone();
        reversed.reverse();
        let backward = builder.build(&to_source_modules(&reversed)).unwrap();

        prop_assert_eq!(forward, backward);
    }

    /// Every value is the hash of its own key, and keys are sorted.
    #[test]
    fn manifest_is_consistent_and_sorted(mods in modules()) {
        let manifest = ManifestBuilder::default().build(&to_source_modules(&mods)).unwrap();
        prop_assert!(manifest.is_consistent());

        let keys: Vec<_> = manifest.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    /// Normalizing an already normalized key gives the key back.
    #[test]
    fn normalization_is_idempotent(op in operation(), typename in any::<bool>()) {
        let options = NormalizeOptions { add_typename: typename };
        let keys = normalize(&op, options).unwrap();
        prop_assert_eq!(keys.len(), 1);

        for key in &keys {
            let again = normalize(key, options).unwrap();
            prop_assert_eq!(again, BTreeSet::from([key.clone()]));
        }
    }

    /// One key per distinct operation text, regardless of duplicates.
    #[test]
    fn key_set_matches_distinct_operations(ops in prop::collection::vec(operation(), 1..6)) {
        let mut doubled = ops.clone();
        doubled.extend(ops.iter().cloned());

        let mut expected = BTreeSet::new();
        for op in &ops {
            expected.extend(normalize(op, NormalizeOptions::default()).unwrap());
        }

        let manifest = ManifestBuilder::default()
            .build(&to_source_modules(&[doubled]))
            .unwrap();
        let keys: BTreeSet<String> = manifest.keys().map(str::to_string).collect();
        prop_assert_eq!(keys, expected);
    }

    /// Literal strings are kept verbatim and hashed as-is.
    #[test]
    fn literals_hashed_verbatim(literals in prop::collection::btree_set(".{1,40}", 1..5)) {
        let module = SourceModule::new("/app/raw.js")
            .with_contribution(Contribution::Literals(literals.clone()));
        let manifest = ManifestBuilder::default().build([&module]).unwrap();

        for literal in &literals {
            prop_assert_eq!(manifest.get(literal), Some(&QueryHash::compute(literal)));
        }
    }

    /// The manifest JSON always parses back to the same manifest.
    #[test]
    fn json_parses_back(keys in prop::collection::vec(".{0,30}", 0..6)) {
        let manifest = Manifest::from_keys(keys);
        let parsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
        prop_assert_eq!(parsed, manifest);
    }

    /// Republishing any manifest a second time is a no-op.
    #[test]
    fn republish_is_noop(mods in modules()) {
        let coordinator = Coordinator::new();
        let mut pass = BuildPass::new("/app");
        for module in to_source_modules(&mods) {
            pass.add_module(module);
        }
        let manifest = ManifestBuilder::default().build(pass.modules()).unwrap();

        prop_assert!(coordinator.publish(manifest.clone()).unwrap().is_updated());
        prop_assert!(!coordinator.publish(manifest).unwrap().is_updated());
    }
}

#[test]
fn templates_and_documents_equivalent() {
    let query = "query getCount { count { amount } }";
    let mut templates = BTreeMap::new();
    templates.insert(query.to_string(), query.to_string());

    let builder = ManifestBuilder::default();
    let from_template = builder
        .build([&SourceModule::new("/a.js").with_contribution(Contribution::Templates(templates))])
        .unwrap();
    let from_document = builder
        .build([&SourceModule::new("/a.graphql")
            .with_contribution(Contribution::Document(query.to_string()))])
        .unwrap();

    assert_eq!(from_template, from_document);
}
