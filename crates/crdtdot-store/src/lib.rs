//! # crdtdot-store
//!
//! Read-only access to the content-addressed block store that holds a
//! replica's Merkle-DAG of CRDT deltas.
//!
//! This crate provides:
//! - Content identifiers ([`Cid`]) built from a codec tag and a SHA-256 digest
//! - The namespaced key layout blocks and head markers are stored under
//! - The [`BlockStore`] capability with in-memory and filesystem backends
//! - [`BlockAccessor`], which resolves identifiers and lists heads
//!
//! ## Example
//!
//! ```rust
//! use crdtdot_store::{BlockAccessor, Cid, Codec, MemoryBlockStore, Namespace};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MemoryBlockStore::new());
//! let ns = Namespace::new("/crdt");
//!
//! let bytes = b"{}".to_vec();
//! let cid = Cid::of(Codec::DagJson, &bytes);
//! store.put(ns.block_key(&cid), bytes.clone());
//! store.put(ns.head_key(&cid), Vec::new());
//!
//! let accessor = BlockAccessor::new(store, ns);
//! assert_eq!(accessor.fetch(&cid).await.unwrap(), bytes);
//! assert!(accessor.heads().await.unwrap().contains(&cid));
//! # });
//! ```

mod accessor;
mod cid;
mod fs;
mod hash;
mod key;
mod store;

pub use accessor::{BlockAccessor, HeadSet};
pub use cid::{Cid, CidParseError, Codec, CID_STR_LEN};
pub use fs::FsBlockStore;
pub use hash::{Hash, HASH_LEN};
pub use key::{Key, Namespace};
pub use store::{BlockStore, MemoryBlockStore, Result, StoreError};
