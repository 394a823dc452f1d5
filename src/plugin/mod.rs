//! plugin
//!
//! Host-facing glue: the hooks a build tool calls during a pass.
//!
//! # Modes
//!
//! A plugin is created in one of two modes, fixed at construction:
//!
//! - [`Mode::Standalone`]: the plugin produces the manifest. At every seal
//!   of a top-level pass it builds the manifest from the pass's modules and
//!   publishes it through its own [`Coordinator`].
//! - [`Mode::Consumer`]: the plugin generates nothing. It subscribes to a
//!   producer's coordinator and mirrors every update into its own manifest
//!   module.
//!
//! # Hook Order
//!
//! ```text
//! on_compilation -> after_resolve (per module) -> on_seal -> after_compile
//! ```
//!
//! # Resolution Gate
//!
//! In consumer mode, resolving the manifest module before the producer has
//! published anything is suspended, not failed. The suspended resolution
//! resumes as soon as the first manifest arrives. If the producer never
//! publishes, the resolution never completes; there is no timeout.
//!
//! # Example
//!
//! ```
//! use persistgql::build::{BuildPass, Contribution, SourceModule};
//! use persistgql::core::config::ManifestConfig;
//! use persistgql::plugin::{Mode, PersistPlugin, SealOutcome};
//!
//! let config = ManifestConfig {
//!     module_name: Some("persisted_queries.json".into()),
//!     filename: Some("output_queries.json".into()),
//!     ..Default::default()
//! };
//! let plugin = PersistPlugin::new(&config, Mode::Standalone).unwrap();
//!
//! let mut pass = BuildPass::new("/app");
//! plugin.on_compilation(&pass);
//! pass.add_module(
//!     SourceModule::new("/app/example.graphql")
//!         .with_contribution(Contribution::Document("query getCount { count { amount } }".into())),
//! );
//!
//! let outcome = plugin.on_seal(&mut pass).unwrap();
//! assert!(matches!(outcome, SealOutcome::Published(_)));
//! assert!(pass.asset("output_queries.json").is_some());
//! ```

mod consumer;
pub mod virtual_modules;

pub use virtual_modules::VirtualModules;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use self::consumer::ConsumerLink;
use crate::build::{BuildError, BuildPass, ManifestBuilder};
use crate::coordinator::{Coordinator, PublishedManifest};
use crate::core::config::{ConfigError, ManifestConfig};
use crate::core::manifest::EMPTY_MODULE_SOURCE;

/// Errors from plugin hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid plugin configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Operating mode, chosen at construction.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Generate and publish the manifest.
    Standalone,
    /// Receive the manifest from a producer.
    Consumer { producer: Arc<Coordinator> },
}

enum Role {
    Producer {
        coordinator: Arc<Coordinator>,
    },
    Consumer {
        producer: Arc<Coordinator>,
        link: Arc<ConsumerLink>,
    },
}

/// A module resolution handed to the plugin by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The request as written by the importing module.
    pub request: String,
    /// The file the request resolved to.
    pub resource: PathBuf,
}

impl Resolution {
    pub fn new(request: impl Into<String>, resource: impl Into<PathBuf>) -> Self {
        Self {
            request: request.into(),
            resource: resource.into(),
        }
    }
}

/// What happened to a resolution passed to [`PersistPlugin::after_resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveDecision {
    /// The callback already ran.
    Proceeded,
    /// The callback will run once the first manifest is published.
    Deferred,
}

/// Result of the seal hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealOutcome {
    /// Nothing was generated (consumer mode or nested pass).
    Skipped,
    /// The manifest matched the current record; nothing was republished.
    Unchanged(Arc<PublishedManifest>),
    /// A new manifest was published.
    Published(Arc<PublishedManifest>),
}

/// Persisted-query manifest plugin for one build configuration.
pub struct PersistPlugin {
    module_name: String,
    filename: Option<String>,
    builder: ManifestBuilder,
    modules: Arc<VirtualModules>,
    role: Role,
}

impl PersistPlugin {
    /// Create a plugin.
    ///
    /// In consumer mode the plugin subscribes to the producer immediately;
    /// if the producer has already published, that manifest is adopted.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Config` if `module_name` is missing or the
    /// config is otherwise invalid.
    pub fn new(config: &ManifestConfig, mode: Mode) -> Result<Self, PluginError> {
        config.validate()?;
        let module_name = config.require_module_name()?.to_string();
        let modules = Arc::new(VirtualModules::new());

        let role = match mode {
            Mode::Standalone => {
                let coordinator = Coordinator::new();
                // Registered first so the module is rewritten before any consumer hears of it.
                let writer_modules = Arc::clone(&modules);
                let path = module_name.clone();
                coordinator.subscribe(Arc::new(move |published: &Arc<PublishedManifest>| {
                    writer_modules.write_module(&path, published.module_source());
                }));
                Role::Producer { coordinator }
            }
            Mode::Consumer { producer } => {
                let link = Arc::new(ConsumerLink::new(&module_name, Arc::clone(&modules)));
                producer.subscribe(Arc::clone(&link) as Arc<dyn crate::coordinator::Subscriber>);
                if let Some(current) = producer.current() {
                    crate::coordinator::Subscriber::on_update(link.as_ref(), &current);
                }
                Role::Consumer { producer, link }
            }
        };

        tracing::debug!(
            module_name = %module_name,
            consumer = matches!(role, Role::Consumer { .. }),
            "plugin created"
        );
        Ok(Self {
            module_name,
            filename: config.filename.clone(),
            builder: ManifestBuilder::from_config(config),
            modules,
            role,
        })
    }

    /// Path the manifest module is resolvable at.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Asset name the manifest is emitted under, if configured.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_consumer(&self) -> bool {
        matches!(self.role, Role::Consumer { .. })
    }

    /// The coordinator consumers of this plugin should link to.
    ///
    /// For a consumer this is its own producer, so consumers can be chained.
    pub fn coordinator(&self) -> Arc<Coordinator> {
        match &self.role {
            Role::Producer { coordinator } => Arc::clone(coordinator),
            Role::Consumer { producer, .. } => Arc::clone(producer),
        }
    }

    pub fn virtual_modules(&self) -> &Arc<VirtualModules> {
        &self.modules
    }

    /// Current source of the manifest module, if initialised.
    pub fn module_source(&self) -> Option<String> {
        self.modules.read(&self.module_name)
    }

    /// The manifest this plugin currently agrees on.
    pub fn manifest(&self) -> Option<Arc<PublishedManifest>> {
        match &self.role {
            Role::Producer { coordinator } => coordinator.current(),
            Role::Consumer { link, .. } => link.current(),
        }
    }

    /// Check whether a request targets the manifest module.
    pub fn is_manifest_request(&self, request: &str) -> bool {
        request.contains(self.module_name.as_str())
    }

    fn is_manifest_resource(&self, pass: &BuildPass, resource: &Path) -> bool {
        resource == Path::new(&self.module_name)
            || resource == pass.context().join(&self.module_name)
    }

    /// Compilation start hook.
    ///
    /// Initialises the manifest module to an empty manifest for a top-level
    /// pass when no manifest exists yet.
    pub fn on_compilation(&self, pass: &BuildPass) {
        if pass.is_child() || self.manifest().is_some() {
            return;
        }
        self.modules
            .write_module(&self.module_name, EMPTY_MODULE_SOURCE);
        tracing::debug!(pass = %pass.id(), "initialised empty manifest module");
    }

    /// After-resolve hook.
    ///
    /// Calls `done` with the resolution, immediately or, for a consumer's
    /// manifest request made before the first publication, once the
    /// manifest arrives.
    pub fn after_resolve<F>(&self, resolution: Resolution, done: F) -> ResolveDecision
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        match &self.role {
            Role::Consumer { link, .. } if self.is_manifest_request(&resolution.request) => {
                if link.gate().enter(move |_| done(resolution)) {
                    ResolveDecision::Deferred
                } else {
                    ResolveDecision::Proceeded
                }
            }
            _ => {
                done(resolution);
                ResolveDecision::Proceeded
            }
        }
    }

    /// Async form of [`PersistPlugin::after_resolve`].
    pub fn resolve(
        &self,
        resolution: Resolution,
    ) -> impl Future<Output = Resolution> + Send + 'static {
        let wait = match &self.role {
            Role::Consumer { link, .. } if self.is_manifest_request(&resolution.request) => {
                Some(link.gate().wait())
            }
            _ => None,
        };

        async move {
            if let Some(wait) = wait {
                // None only if the plugin was dropped; resolve as-is.
                let _ = wait.await;
            }
            resolution
        }
    }

    /// Seal hook: build and publish the manifest.
    ///
    /// Only a standalone plugin sealing a top-level pass generates anything.
    /// When the manifest changed, already-built copies of the manifest
    /// module in the pass are patched. When `filename` is configured the
    /// manifest is emitted as an asset of the pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus fails to parse; nothing is published.
    pub fn on_seal(&self, pass: &mut BuildPass) -> Result<SealOutcome, PluginError> {
        let Role::Producer { coordinator } = &self.role else {
            return Ok(SealOutcome::Skipped);
        };
        if pass.is_child() {
            tracing::debug!(pass = %pass.id(), "nested pass, not generating manifest");
            return Ok(SealOutcome::Skipped);
        }

        let manifest = self.builder.build(pass.modules())?;
        let outcome = coordinator.publish(manifest)?;
        let published = Arc::clone(outcome.published());

        if outcome.is_updated() {
            let source = published.module_source();
            let targets: Vec<usize> = pass
                .modules()
                .iter()
                .enumerate()
                .filter(|(_, module)| self.is_manifest_resource(pass, module.resource()))
                .map(|(index, _)| index)
                .collect();
            for index in targets {
                pass.modules_mut()[index].set_source(source.clone());
            }
        }

        if let Some(filename) = &self.filename {
            pass.emit_asset(filename, published.json());
        }

        Ok(if outcome.is_updated() {
            SealOutcome::Published(published)
        } else {
            SealOutcome::Unchanged(published)
        })
    }

    /// After-compile hook.
    ///
    /// A consumer with a configured `filename` emits the manifest it
    /// received as an asset of each top-level pass.
    pub fn after_compile(&self, pass: &mut BuildPass) {
        let (Role::Consumer { link, .. }, Some(filename)) = (&self.role, &self.filename) else {
            return;
        };
        if pass.is_child() {
            return;
        }

        match link.current() {
            Some(published) => pass.emit_asset(filename, published.json()),
            None => tracing::warn!(
                pass = %pass.id(),
                "no manifest received from producer, skipping asset"
            ),
        }
    }
}

impl std::fmt::Debug for PersistPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistPlugin")
            .field("module_name", &self.module_name)
            .field("filename", &self.filename)
            .field("consumer", &self.is_consumer())
            .finish()
    }
}
