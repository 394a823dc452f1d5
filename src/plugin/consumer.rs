//! plugin::consumer
//!
//! The consumer side of a producer/consumer link.
//!
//! A consumer keeps its own copy of the producer's publication record,
//! mirrors it into its manifest module, and owns the resolution gate that
//! holds back manifest resolutions until the first update arrives.
//!
//! Updates may arrive out of order when the consumer adopts the producer's
//! current record while the producer is publishing on another thread. The
//! record only moves forward: an update whose revision is not newer than the
//! one held is dropped.

use std::sync::{Arc, PoisonError, RwLock};

use super::VirtualModules;
use crate::coordinator::{PublishedManifest, ResolutionGate, Subscriber};

/// Subscriber registered with the producer's coordinator.
#[derive(Debug)]
pub(crate) struct ConsumerLink {
    module_name: String,
    modules: Arc<VirtualModules>,
    record: RwLock<Option<Arc<PublishedManifest>>>,
    gate: ResolutionGate,
}

impl ConsumerLink {
    pub(crate) fn new(module_name: impl Into<String>, modules: Arc<VirtualModules>) -> Self {
        Self {
            module_name: module_name.into(),
            modules,
            record: RwLock::new(None),
            gate: ResolutionGate::new(),
        }
    }

    /// Latest manifest received from the producer.
    pub(crate) fn current(&self) -> Option<Arc<PublishedManifest>> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn gate(&self) -> &ResolutionGate {
        &self.gate
    }
}

impl Subscriber for ConsumerLink {
    fn on_update(&self, published: &Arc<PublishedManifest>) {
        {
            let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(current) = record.as_ref() {
                if published.revision() <= current.revision() {
                    tracing::debug!(
                        revision = published.revision(),
                        current = current.revision(),
                        "ignoring stale manifest"
                    );
                    return;
                }
            }

            // Written under the record lock so the module never lags the record.
            self.modules
                .write_module(&self.module_name, published.module_source());
            *record = Some(Arc::clone(published));
        }
        tracing::debug!(revision = published.revision(), "consumer received manifest");

        self.gate.release(Arc::clone(published));
    }
}
