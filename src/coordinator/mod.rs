//! coordinator
//!
//! Holds the current manifest of a producing build and fans updates out to
//! the builds that depend on it.
//!
//! # States
//!
//! ```text
//! Uninitialized --publish--> Published(1) --publish(changed)--> Published(2) ...
//! ```
//!
//! There is no terminal state: every seal of the producer may publish again.
//!
//! # Invariants
//!
//! - The publication record is replaced as a whole; readers clone an `Arc`
//!   and never observe a partially written manifest
//! - Publishing a manifest whose canonical JSON equals the current record
//!   has no side effects and notifies nobody
//! - Subscribers are notified synchronously, in registration order, after
//!   the record has been replaced and outside of any coordinator lock
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use persistgql::coordinator::{Coordinator, PublishedManifest, Subscriber};
//! use persistgql::core::manifest::Manifest;
//!
//! let coordinator = Coordinator::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! coordinator.subscribe(Arc::new(move |published: &Arc<PublishedManifest>| {
//!     sink.lock().unwrap().push(published.revision());
//! }));
//!
//! let manifest = Manifest::from_keys(vec!["query a {\n  x\n}\n".to_string()]);
//! assert!(coordinator.publish(manifest.clone()).unwrap().is_updated());
//! assert!(!coordinator.publish(manifest).unwrap().is_updated());
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

pub mod gate;

pub use gate::{Continuation, GateStatus, ResolutionGate};

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::core::manifest::{module_source, Manifest};

/// A manifest together with its canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedManifest {
    revision: u64,
    manifest: Manifest,
    json: String,
}

impl PublishedManifest {
    /// Serialize `manifest` and tag it with a revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn new(revision: u64, manifest: Manifest) -> Result<Self, serde_json::Error> {
        let json = manifest.to_json()?;
        Ok(Self {
            revision,
            manifest,
            json,
        })
    }

    /// Revision of the publishing coordinator, starting at 1.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Canonical JSON form of the manifest.
    pub fn json(&self) -> &str {
        &self.json
    }

    /// Source of the manifest module for this manifest.
    pub fn module_source(&self) -> String {
        module_source(&self.json)
    }
}

/// Receives every manifest update of a coordinator.
pub trait Subscriber: Send + Sync {
    fn on_update(&self, published: &Arc<PublishedManifest>);
}

impl<F> Subscriber for F
where
    F: Fn(&Arc<PublishedManifest>) + Send + Sync,
{
    fn on_update(&self, published: &Arc<PublishedManifest>) {
        self(published)
    }
}

/// State of a coordinator's publication record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Nothing has been published yet.
    Uninitialized,
    /// A manifest is available at the given revision.
    Published { revision: u64 },
}

/// Result of a publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The record changed and subscribers were notified.
    Updated(Arc<PublishedManifest>),
    /// The record already held this manifest; nothing happened.
    Unchanged(Arc<PublishedManifest>),
}

impl PublishOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, PublishOutcome::Updated(_))
    }

    /// The manifest now held by the record.
    pub fn published(&self) -> &Arc<PublishedManifest> {
        match self {
            PublishOutcome::Updated(published) | PublishOutcome::Unchanged(published) => {
                published
            }
        }
    }
}

/// Publication record plus the subscribers that follow it.
///
/// Shared between the producing build and its consumers as an
/// `Arc<Coordinator>`; there is no global state.
pub struct Coordinator {
    record: RwLock<Option<Arc<PublishedManifest>>>,
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl Coordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            record: RwLock::new(None),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Register a subscriber for every future update.
    ///
    /// May be called before the first publication. A subscriber added after
    /// a publication is not replayed the current record; read it with
    /// [`Coordinator::current`].
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.push(subscriber);
        tracing::debug!(subscribers = subscribers.len(), "subscriber registered");
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The current publication record, if any.
    pub fn current(&self) -> Option<Arc<PublishedManifest>> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> CoordinatorState {
        match self.current() {
            None => CoordinatorState::Uninitialized,
            Some(published) => CoordinatorState::Published {
                revision: published.revision(),
            },
        }
    }

    /// Publish a manifest.
    ///
    /// If its canonical JSON differs from the current record, the record is
    /// replaced and every subscriber is notified in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized; the record is
    /// left untouched.
    pub fn publish(&self, manifest: Manifest) -> Result<PublishOutcome, serde_json::Error> {
        let json = manifest.to_json()?;

        let published = {
            let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(current) = record.as_ref() {
                if current.json() == json {
                    tracing::debug!(revision = current.revision(), "manifest unchanged");
                    return Ok(PublishOutcome::Unchanged(Arc::clone(current)));
                }
            }

            let revision = record.as_ref().map_or(1, |current| current.revision() + 1);
            let published = Arc::new(PublishedManifest {
                revision,
                manifest,
                json,
            });
            *record = Some(Arc::clone(&published));
            published
        };

        self.notify(&published);
        Ok(PublishOutcome::Updated(published))
    }

    fn notify(&self, published: &Arc<PublishedManifest>) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::info!(
            revision = published.revision(),
            operations = published.manifest().len(),
            subscribers = subscribers.len(),
            "published manifest"
        );
        for subscriber in subscribers {
            subscriber.on_update(published);
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(keys: &[&str]) -> Manifest {
        Manifest::from_keys(keys.iter().map(|k| k.to_string()))
    }

    fn recorder(coordinator: &Coordinator) -> Arc<Mutex<Vec<u64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        coordinator.subscribe(Arc::new(move |p: &Arc<PublishedManifest>| {
            sink.lock().unwrap().push(p.revision());
        }));
        seen
    }

    mod publish {
        use super::*;

        #[test]
        fn starts_uninitialized() {
            let coordinator = Coordinator::new();
            assert_eq!(coordinator.state(), CoordinatorState::Uninitialized);
            assert!(coordinator.current().is_none());
        }

        #[test]
        fn first_publish_always_updates() {
            let coordinator = Coordinator::new();
            let seen = recorder(&coordinator);

            let outcome = coordinator.publish(Manifest::new()).unwrap();
            assert!(outcome.is_updated());
            assert_eq!(outcome.published().json(), "{}");
            assert_eq!(coordinator.state(), CoordinatorState::Published { revision: 1 });
            assert_eq!(*seen.lock().unwrap(), vec![1]);
        }

        #[test]
        fn identical_manifest_is_noop() {
            let coordinator = Coordinator::new();
            let seen = recorder(&coordinator);

            coordinator.publish(manifest(&["a"])).unwrap();
            let outcome = coordinator.publish(manifest(&["a"])).unwrap();

            assert!(!outcome.is_updated());
            assert_eq!(outcome.published().revision(), 1);
            assert_eq!(*seen.lock().unwrap(), vec![1]);
        }

        #[test]
        fn changed_manifest_bumps_revision() {
            let coordinator = Coordinator::new();
            let seen = recorder(&coordinator);

            coordinator.publish(manifest(&["a"])).unwrap();
            coordinator.publish(manifest(&["a", "b"])).unwrap();
            coordinator.publish(manifest(&["a"])).unwrap();

            assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
            assert_eq!(coordinator.current().unwrap().manifest(), &manifest(&["a"]));
        }

        #[test]
        fn readers_keep_their_snapshot() {
            let coordinator = Coordinator::new();
            coordinator.publish(manifest(&["a"])).unwrap();
            let snapshot = coordinator.current().unwrap();

            coordinator.publish(manifest(&["b"])).unwrap();

            assert!(snapshot.manifest().contains("a"));
            assert!(coordinator.current().unwrap().manifest().contains("b"));
        }
    }

    mod subscribers {
        use super::*;

        #[test]
        fn notified_in_registration_order() {
            let coordinator = Coordinator::new();
            let order = Arc::new(Mutex::new(Vec::new()));

            for name in ["first", "second", "third"] {
                let order = Arc::clone(&order);
                coordinator.subscribe(Arc::new(move |_: &Arc<PublishedManifest>| {
                    order.lock().unwrap().push(name);
                }));
            }

            coordinator.publish(manifest(&["a"])).unwrap();
            assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        }

        #[test]
        fn subscriber_sees_replaced_record() {
            let coordinator = Coordinator::new();
            let observed = Arc::new(Mutex::new(None));

            let weak = Arc::downgrade(&coordinator);
            let slot = Arc::clone(&observed);
            coordinator.subscribe(Arc::new(move |_: &Arc<PublishedManifest>| {
                let current = weak.upgrade().and_then(|c| c.current());
                *slot.lock().unwrap() = current.map(|p| p.revision());
            }));

            coordinator.publish(manifest(&["a"])).unwrap();
            assert_eq!(*observed.lock().unwrap(), Some(1));
        }

        #[test]
        fn late_subscriber_not_replayed() {
            let coordinator = Coordinator::new();
            coordinator.publish(manifest(&["a"])).unwrap();

            let seen = recorder(&coordinator);
            assert!(seen.lock().unwrap().is_empty());
            assert_eq!(coordinator.subscriber_count(), 1);
        }
    }

    #[test]
    fn published_module_source() {
        let published = PublishedManifest::new(1, Manifest::new()).unwrap();
        assert_eq!(published.module_source(), "module.exports = {};");
    }
}
