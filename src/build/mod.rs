//! build
//!
//! Build passes, their modules, and manifest generation at seal time.
//!
//! # Model
//!
//! A [`BuildPass`] is one compilation run of the host build tool. It owns
//! the modules resolved during the pass and the assets emitted for it. A
//! pass created with [`BuildPass::child`] is nested inside its parent (for
//! example a server-side rendering sub-compile); nested passes never
//! generate a manifest or emit the manifest asset.
//!
//! Extraction adapters attach a [`Contribution`] to each module that holds
//! GraphQL before the pass is sealed. Modules without a contribution are
//! ignored by the aggregator.
//!
//! # Modules
//!
//! - [`aggregate`] - Collects contributions into one corpus per pass
//! - [`builder`] - Normalizes, hashes and sorts the corpus into a manifest

pub mod aggregate;
pub mod builder;

pub use aggregate::{aggregate, Corpus};
pub use builder::{BuildError, ManifestBuilder};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PASS_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a build pass, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u64);

impl PassId {
    fn next() -> Self {
        Self(NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pass-{}", self.0)
    }
}

/// GraphQL attached to a module by an extraction adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// Template-tag literals found in a script file, mapped to their
    /// extracted text. The literals are appended to the corpus.
    Templates(BTreeMap<String, String>),

    /// Raw source of a `.graphql` file, appended to the corpus.
    Document(String),

    /// Exact operation strings that skip normalization and become
    /// manifest keys verbatim.
    Literals(BTreeSet<String>),
}

/// A module compiled in a build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    resource: PathBuf,
    contribution: Option<Contribution>,
    source: Option<String>,
}

impl SourceModule {
    /// Create a module with no GraphQL and no compiled source.
    pub fn new(resource: impl Into<PathBuf>) -> Self {
        Self {
            resource: resource.into(),
            contribution: None,
            source: None,
        }
    }

    /// Attach a GraphQL contribution.
    pub fn with_contribution(mut self, contribution: Contribution) -> Self {
        self.contribution = Some(contribution);
        self
    }

    /// Attach compiled source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Path of the file this module was built from.
    pub fn resource(&self) -> &Path {
        &self.resource
    }

    /// GraphQL contributed by this module, if any.
    pub fn contribution(&self) -> Option<&Contribution> {
        self.contribution.as_ref()
    }

    /// Compiled source of this module, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Replace the compiled source.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }
}

/// One compilation run.
#[derive(Debug)]
pub struct BuildPass {
    id: PassId,
    parent: Option<PassId>,
    context: PathBuf,
    modules: Vec<SourceModule>,
    assets: BTreeMap<String, String>,
}

impl BuildPass {
    /// Create a top-level pass rooted at `context`.
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            id: PassId::next(),
            parent: None,
            context: context.into(),
            modules: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Create a pass nested inside this one.
    pub fn child(&self) -> Self {
        Self {
            id: PassId::next(),
            parent: Some(self.id),
            context: self.context.clone(),
            modules: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn parent(&self) -> Option<PassId> {
        self.parent
    }

    /// Check if this pass is nested inside another pass.
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// Directory relative module paths are resolved against.
    pub fn context(&self) -> &Path {
        &self.context
    }

    pub fn add_module(&mut self, module: SourceModule) {
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [SourceModule] {
        &mut self.modules
    }

    /// Add (or replace) an output asset.
    pub fn emit_asset(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.assets.insert(name.into(), contents.into());
    }

    pub fn asset(&self, name: &str) -> Option<&str> {
        self.assets.get(name).map(String::as_str)
    }

    pub fn assets(&self) -> &BTreeMap<String, String> {
        &self.assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pass {
        use super::*;

        #[test]
        fn top_level_has_no_parent() {
            let pass = BuildPass::new("/project");
            assert!(!pass.is_child());
            assert!(pass.parent().is_none());
            assert_eq!(pass.context(), Path::new("/project"));
        }

        #[test]
        fn child_links_to_parent() {
            let parent = BuildPass::new("/project");
            let child = parent.child();
            assert!(child.is_child());
            assert_eq!(child.parent(), Some(parent.id()));
            assert_ne!(child.id(), parent.id());
            assert_eq!(child.context(), parent.context());
        }

        #[test]
        fn ids_are_unique() {
            let a = BuildPass::new("/a");
            let b = BuildPass::new("/a");
            assert_ne!(a.id(), b.id());
        }

        #[test]
        fn assets_replace_by_name() {
            let mut pass = BuildPass::new("/project");
            pass.emit_asset("out.json", "{}");
            pass.emit_asset("out.json", "{\"a\":\"b\"}");
            assert_eq!(pass.assets().len(), 1);
            assert_eq!(pass.asset("out.json"), Some("{\"a\":\"b\"}"));
        }
    }

    mod module {
        use super::*;

        #[test]
        fn builder_methods() {
            let module = SourceModule::new("/project/a.graphql")
                .with_contribution(Contribution::Document("query a { x }".into()))
                .with_source("module.exports = null;");

            assert_eq!(module.resource(), Path::new("/project/a.graphql"));
            assert_eq!(
                module.contribution(),
                Some(&Contribution::Document("query a { x }".into()))
            );
            assert_eq!(module.source(), Some("module.exports = null;"));
        }

        #[test]
        fn set_source_replaces() {
            let mut module = SourceModule::new("/project/a.js");
            assert!(module.source().is_none());
            module.set_source("x");
            assert_eq!(module.source(), Some("x"));
        }
    }
}
