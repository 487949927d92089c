//! Namespaced access to a replica's blocks and head markers.

use crate::cid::Cid;
use crate::key::Namespace;
use crate::store::{BlockStore, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// The set of heads a traversal starts from, kept sorted.
pub type HeadSet = BTreeSet<Cid>;

/// A read-only view of one replica inside a shared block store.
#[derive(Clone)]
pub struct BlockAccessor {
    store: Arc<dyn BlockStore>,
    namespace: Namespace,
}

impl BlockAccessor {
    pub fn new(store: Arc<dyn BlockStore>, namespace: Namespace) -> Self {
        BlockAccessor { store, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Fetch the serialized block identified by `cid`.
    pub async fn fetch(&self, cid: &Cid) -> Result<Vec<u8>> {
        self.store.get(&self.namespace.block_key(cid)).await
    }

    /// Check that the underlying store is reachable.
    pub async fn check(&self) -> Result<()> {
        self.store.check().await
    }

    /// Read the head markers stored for this replica.
    ///
    /// Marker names that are not valid identifiers are skipped.
    pub async fn heads(&self) -> Result<HeadSet> {
        let prefix = self.namespace.heads_prefix();
        let keys = self.store.keys(&prefix).await?;

        let mut heads = HeadSet::new();
        for key in keys {
            match key.name().parse::<Cid>() {
                Ok(cid) => {
                    heads.insert(cid);
                }
                Err(e) => warn!(key = %key, error = %e, "ignoring malformed head marker"),
            }
        }
        debug!(namespace = %self.namespace.root(), count = heads.len(), "loaded heads");
        Ok(heads)
    }
}

impl std::fmt::Debug for BlockAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockAccessor")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
