//! coordinator::gate
//!
//! One-shot gate that holds back manifest module resolutions until a
//! manifest has been published.
//!
//! # States
//!
//! ```text
//! Waiting(queue) --release--> Released(manifest) --release--> Released(newer)
//! ```
//!
//! While `Waiting`, each resolution that reaches the gate is queued as a
//! continuation. The first `release` drains the queue in arrival order. From
//! then on continuations run immediately with the latest manifest; the gate
//! never goes back to `Waiting`.
//!
//! # Hang Semantics
//!
//! There is no timeout. If nothing ever calls `release`, queued
//! continuations never run and futures from [`ResolutionGate::wait`] never
//! complete. Callers that need a bound wrap `wait()` in their own timeout
//! (for example `tokio::time::timeout`).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use persistgql::coordinator::gate::ResolutionGate;
//! use persistgql::coordinator::PublishedManifest;
//! use persistgql::core::manifest::Manifest;
//!
//! let gate = ResolutionGate::new();
//! let resolved = Arc::new(AtomicBool::new(false));
//!
//! let flag = Arc::clone(&resolved);
//! let deferred = gate.enter(move |_manifest| flag.store(true, Ordering::SeqCst));
//! assert!(deferred);
//! assert!(!resolved.load(Ordering::SeqCst));
//!
//! let published = Arc::new(PublishedManifest::new(1, Manifest::new()).unwrap());
//! gate.release(published);
//! assert!(resolved.load(Ordering::SeqCst));
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use super::PublishedManifest;

/// A suspended resolution, resumed with the published manifest.
pub type Continuation = Box<dyn FnOnce(Arc<PublishedManifest>) + Send>;

enum GateState {
    Waiting(VecDeque<Continuation>),
    Released(Arc<PublishedManifest>),
}

/// Observable status of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    /// No manifest yet; `pending` resolutions are queued.
    Waiting { pending: usize },
    /// A manifest is available; resolutions proceed immediately.
    Released { revision: u64 },
}

/// Suspend-then-release gate for manifest module resolutions.
pub struct ResolutionGate {
    state: Mutex<GateState>,
}

impl ResolutionGate {
    /// Create a gate in the `Waiting` state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Waiting(VecDeque::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> GateStatus {
        match &*self.lock() {
            GateState::Waiting(queue) => GateStatus::Waiting {
                pending: queue.len(),
            },
            GateState::Released(published) => GateStatus::Released {
                revision: published.revision(),
            },
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self.status(), GateStatus::Released { .. })
    }

    /// Pass a resolution through the gate.
    ///
    /// Runs `continuation` immediately if the gate is released, otherwise
    /// queues it. Returns `true` if the continuation was deferred.
    pub fn enter<F>(&self, continuation: F) -> bool
    where
        F: FnOnce(Arc<PublishedManifest>) + Send + 'static,
    {
        let published = {
            let mut state = self.lock();
            match &mut *state {
                GateState::Released(published) => Arc::clone(published),
                GateState::Waiting(queue) => {
                    queue.push_back(Box::new(continuation));
                    tracing::debug!(
                        pending = queue.len(),
                        "resolution deferred until first publication"
                    );
                    return true;
                }
            }
        };

        continuation(published);
        false
    }

    /// Release the gate with a published manifest.
    ///
    /// The first call drains every queued continuation in arrival order;
    /// later calls only update the manifest handed to new entries, and only
    /// when their revision is newer. Returns the number of continuations
    /// resumed.
    pub fn release(&self, published: Arc<PublishedManifest>) -> usize {
        let drained = {
            let mut state = self.lock();
            match &mut *state {
                GateState::Released(current) => {
                    if published.revision() > current.revision() {
                        *current = Arc::clone(&published);
                    }
                    VecDeque::new()
                }
                GateState::Waiting(queue) => {
                    let queue = std::mem::take(queue);
                    *state = GateState::Released(Arc::clone(&published));
                    queue
                }
            }
        };

        let resumed = drained.len();
        if resumed > 0 {
            tracing::debug!(
                resumed,
                revision = published.revision(),
                "released deferred resolutions"
            );
        }
        // Continuations run outside the lock so they may re-enter the gate.
        for continuation in drained {
            continuation(Arc::clone(&published));
        }
        resumed
    }

    /// Wait asynchronously for the gate to be released.
    ///
    /// Resolves immediately if it already is. Resolves to `None` only if the
    /// gate is dropped before being released.
    pub fn wait(
        &self,
    ) -> impl Future<Output = Option<Arc<PublishedManifest>>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.enter(move |published| {
            // The receiver may have been dropped by a cancelled waiter.
            let _ = tx.send(published);
        });
        async move { rx.await.ok() }
    }
}

impl Default for ResolutionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResolutionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionGate")
            .field("status", &self.status())
            .finish()
    }
}
