//! In-memory document collections with watch-based subscriptions.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::StoreError;

/// A document paired with its monotonic version.
///
/// Versions start at 1 and bump on every successful write. They exist
/// so that [`Collection::compare_and_swap`] can reject a write based on
/// a snapshot that is older than reality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<V> {
    pub version: u64,
    pub value: V,
}

struct Slot<V> {
    doc: Versioned<V>,
    /// Per-document notification channel. `None` means deleted.
    tx: watch::Sender<Option<Versioned<V>>>,
}

struct Inner<K, V> {
    docs: HashMap<K, Slot<V>>,
    /// Collection-wide revision, bumped on every write or delete.
    /// Query subscriptions key off this.
    revision: watch::Sender<u64>,
}

/// One document collection. Cheap to clone — all clones share state.
pub struct Collection<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
}

impl<K, V> Clone for Collection<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for Collection<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Collection<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                docs: HashMap::new(),
                revision,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<K, V>> {
        // A poisoned lock means a writer panicked mid-update; the data
        // itself is still a consistent snapshot, so keep serving it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reads the current document.
    pub fn get(&self, key: &K) -> Result<Versioned<V>, StoreError> {
        let inner = self.lock();
        inner
            .docs
            .get(key)
            .map(|slot| slot.doc.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Creates or overwrites a document, returning its new version.
    pub fn put(&self, key: K, value: V) -> u64 {
        let mut inner = self.lock();
        let version = match inner.docs.get_mut(&key) {
            Some(slot) => {
                slot.doc = Versioned {
                    version: slot.doc.version + 1,
                    value,
                };
                let _ = slot.tx.send(Some(slot.doc.clone()));
                slot.doc.version
            }
            None => {
                let doc = Versioned { version: 1, value };
                let (tx, _) = watch::channel(Some(doc.clone()));
                inner.docs.insert(key, Slot { doc, tx });
                1
            }
        };
        inner.revision.send_modify(|r| *r += 1);
        version
    }

    /// Atomically mutates a single document in place.
    ///
    /// The closure runs under the collection lock, so concurrent
    /// updates to different sub-fields of the same document cannot lose
    /// each other — this is the store's "partial field path" write.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let slot = inner
            .docs
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        f(&mut slot.doc.value);
        slot.doc.version += 1;
        let version = slot.doc.version;
        let _ = slot.tx.send(Some(slot.doc.clone()));
        inner.revision.send_modify(|r| *r += 1);
        Ok(version)
    }

    /// Replaces a document only if it is still at `expected` version.
    ///
    /// The optimistic-concurrency primitive: a writer that read version
    /// N writes back with `expected = N`; if anyone else has written in
    /// between, the call fails with [`StoreError::VersionConflict`] and
    /// the writer must re-read.
    pub fn compare_and_swap(
        &self,
        key: &K,
        expected: u64,
        value: V,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let slot = inner
            .docs
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if slot.doc.version != expected {
            tracing::debug!(
                %key,
                expected,
                actual = slot.doc.version,
                "stale write rejected"
            );
            return Err(StoreError::VersionConflict {
                expected,
                actual: slot.doc.version,
            });
        }
        slot.doc = Versioned {
            version: expected + 1,
            value,
        };
        let _ = slot.tx.send(Some(slot.doc.clone()));
        inner.revision.send_modify(|r| *r += 1);
        Ok(expected + 1)
    }

    /// Deletes a document, notifying subscribers with `None`.
    pub fn delete(&self, key: &K) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let slot = inner
            .docs
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let _ = slot.tx.send(None);
        inner.revision.send_modify(|r| *r += 1);
        tracing::trace!(%key, "document deleted");
        Ok(())
    }

    /// Deletes every listed document that exists. Missing keys are
    /// skipped. Returns how many were removed.
    pub fn delete_many(&self, keys: impl IntoIterator<Item = K>) -> usize {
        let mut inner = self.lock();
        let mut removed = 0;
        for key in keys {
            if let Some(slot) = inner.docs.remove(&key) {
                let _ = slot.tx.send(None);
                removed += 1;
            }
        }
        if removed > 0 {
            inner.revision.send_modify(|r| *r += 1);
        }
        removed
    }

    /// All documents matching the predicate, in no particular order.
    pub fn query(&self, pred: impl Fn(&V) -> bool) -> Vec<V> {
        let inner = self.lock();
        inner
            .docs
            .values()
            .filter(|slot| pred(&slot.doc.value))
            .map(|slot| slot.doc.value.clone())
            .collect()
    }

    /// Subscribes to one document's changes.
    ///
    /// Fails with `NotFound` if the document doesn't exist yet; a
    /// deletion after subscribing is observed as a `None` snapshot.
    pub fn subscribe(&self, key: &K) -> Result<DocWatch<V>, StoreError> {
        let inner = self.lock();
        let slot = inner
            .docs
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(DocWatch {
            rx: slot.tx.subscribe(),
        })
    }

    /// Subscribes to the result set of a predicate query.
    ///
    /// The watch fires on *any* collection change; the caller re-runs
    /// the query via [`QueryWatch::current`]. Restartable by simply
    /// subscribing again.
    pub fn subscribe_query(
        &self,
        pred: impl Fn(&V) -> bool + Send + Sync + 'static,
    ) -> QueryWatch<K, V> {
        let rx = self.lock().revision.subscribe();
        QueryWatch {
            collection: self.clone(),
            pred: Arc::new(pred),
            rx,
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// A live subscription to a single document.
///
/// Coalescing: only the latest snapshot is retained, so a consumer that
/// falls behind skips intermediate frames. [`DocWatch::current`]
/// returning `None` means the document was deleted — terminal for every
/// observer loop.
pub struct DocWatch<V> {
    rx: watch::Receiver<Option<Versioned<V>>>,
}

impl<V: Clone> DocWatch<V> {
    /// Waits for the next change. Returns `false` once the channel is
    /// closed (the document was deleted and dropped).
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// The latest snapshot, or `None` if the document was deleted.
    pub fn current(&self) -> Option<Versioned<V>> {
        self.rx.borrow().clone()
    }
}

/// A live subscription to a predicate query over a collection.
pub struct QueryWatch<K, V> {
    collection: Collection<K, V>,
    pred: Arc<dyn Fn(&V) -> bool + Send + Sync>,
    rx: watch::Receiver<u64>,
}

impl<K, V> QueryWatch<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Waits for any change to the collection. Returns `false` once the
    /// collection itself has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Re-runs the query against the current collection contents.
    pub fn current(&self) -> Vec<V> {
        self.collection.query(|v| (self.pred)(v))
    }
}

// =========================================================================
// Tests
// =========================================================================
