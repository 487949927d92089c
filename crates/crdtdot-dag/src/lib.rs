//! # crdtdot-dag
//!
//! Walks the Merkle-DAG of delta-state CRDT blocks that a replica keeps in
//! its block store and renders it as a Graphviz digraph.
//!
//! ## Architecture
//!
//! 1. [`decode`] turns block bytes into a [`DeltaNode`]: parent links,
//!    priority and operation counts
//! 2. [`Traverser`] expands the head set over parent links, fetching each
//!    block once even when several children share it
//! 3. Blocks that cannot be fetched or decoded become holes in the
//!    [`Graph`] instead of failing the export
//! 4. [`DotRenderer`] writes vertices and edges sorted by identifier, so two
//!    exports of the same history are byte-identical
//!
//! ## Example
//!
//! ```rust
//! use crdtdot_dag::{BlockBuilder, CancellationToken, ExportOptions, Exporter};
//! use crdtdot_store::{BlockAccessor, MemoryBlockStore, Namespace};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MemoryBlockStore::new());
//! let ns = Namespace::default();
//!
//! let root = BlockBuilder::new().with_priority(1).build().unwrap();
//! let head = BlockBuilder::new()
//!     .with_parent(root.cid)
//!     .with_priority(2)
//!     .with_tombstone("k")
//!     .build()
//!     .unwrap();
//! for block in [&root, &head] {
//!     store.put(ns.block_key(&block.cid), block.bytes.clone());
//! }
//!
//! let exporter = Exporter::new(BlockAccessor::new(store, ns), ExportOptions::default());
//! let mut dot = Vec::new();
//! let stats = exporter
//!     .export(&[head.cid], &CancellationToken::new(), &mut dot)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(stats.nodes, 2);
//! assert_eq!(stats.edges, 1);
//! # });
//! ```

mod cancel;
mod codec;
mod error;
mod export;
mod graph;
mod render;
mod traverse;
mod visited;

pub use cancel::CancellationToken;
pub use codec::{decode, BlockBuilder, DeltaNode, DeltaSummary, EncodedBlock};
pub use error::{CancelReason, DecodeError, ExportError, Result};
pub use export::{ExportOptions, Exporter};
pub use graph::{Edge, Graph, GraphStats, HoleReason, Vertex};
pub use render::DotRenderer;
pub use traverse::{TraverseConfig, TraverseConfigBuilder, Traverser};
pub use visited::VisitedSet;
