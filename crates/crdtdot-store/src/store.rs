//! Read-only block store capability and an in-memory implementation.
//!
//! The exporter never writes to the store it inspects, so [`BlockStore`]
//! only exposes lookups. Writers (fixtures, tests) use the inherent `put`
//! methods of the concrete stores.

use crate::key::Key;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by a [`BlockStore`].
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Nothing is stored under the key.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// The store cannot serve reads at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A single key could not be read.
    #[error("failed to read {key}: {reason}")]
    Read { key: Key, reason: String },
}

impl StoreError {
    /// Whether the error concerns the whole store rather than one key.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read-only, key-addressed access to a datastore.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait BlockStore: Send + Sync + 'static {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &Key) -> Result<Vec<u8>>;

    /// List every key strictly below `prefix`, sorted.
    async fn keys(&self, prefix: &Key) -> Result<Vec<Key>>;

    /// Check that the store can serve reads.
    async fn check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    async fn get(&self, key: &Key) -> Result<Vec<u8>> {
        (**self).get(key).await
    }

    async fn keys(&self, prefix: &Key) -> Result<Vec<Key>> {
        (**self).keys(prefix).await
    }

    async fn check(&self) -> Result<()> {
        (**self).check().await
    }
}

/// In-memory store used by tests and simulations.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
    offline: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: Key, value: Vec<u8>) {
        self.entries.write().insert(key, value);
    }

    pub fn delete(&self, key: &Key) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate a store that cannot serve any reads.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful and failed `get` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn get(&self, key: &Key) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn keys(&self, prefix: &Key) -> Result<Vec<Key>> {
        self.ensure_online()?;
        Ok(self
            .entries
            .read()
            .keys()
            .filter(|k| k.is_descendant_of(prefix))
            .cloned()
            .collect())
    }

    async fn check(&self) -> Result<()> {
        self.ensure_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_and_missing() {
        let store = MemoryBlockStore::new();
        store.put(Key::new("/a/b"), vec![1, 2, 3]);

        assert_eq!(store.get(&Key::new("/a/b")).await.unwrap(), vec![1, 2, 3]);
        let err = store.get(&Key::new("/a/c")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref k) if k.as_str() == "/a/c"));
        assert!(!err.is_fatal());
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_memory_keys_by_prefix() {
        let store = MemoryBlockStore::new();
        store.put(Key::new("/ns/h/2"), vec![]);
        store.put(Key::new("/ns/h/1"), vec![]);
        store.put(Key::new("/ns/b/1"), vec![]);
        store.put(Key::new("/nsx/h/1"), vec![]);

        let keys = store.keys(&Key::new("/ns/h")).await.unwrap();
        assert_eq!(keys, vec![Key::new("/ns/h/1"), Key::new("/ns/h/2")]);
    }

    #[tokio::test]
    async fn test_offline_store_is_fatal() {
        let store = MemoryBlockStore::new();
        store.put(Key::new("/k"), vec![0]);
        store.set_offline(true);

        let err = store.get(&Key::new("/k")).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(store.check().await.is_err());

        store.set_offline(false);
        assert!(store.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store = Arc::new(MemoryBlockStore::new());
        store.put(Key::new("/x"), b"v".to_vec());
        let shared: Arc<dyn BlockStore> = store.clone();
        assert_eq!(shared.get(&Key::new("/x")).await.unwrap(), b"v".to_vec());
        assert!(store.delete(&Key::new("/x")));
        assert!(store.is_empty());
    }
}
