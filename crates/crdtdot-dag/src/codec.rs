//! Delta block encoding.
//!
//! A `dag-json` block looks like:
//!
//! ```json
//! {
//!   "parents": ["0129…", "0129…"],
//!   "priority": 7,
//!   "delta": { "elements": [ … ], "tombstones": [ … ] }
//! }
//! ```
//!
//! Decoding only extracts the parent links, the priority and how many
//! elements and tombstones the delta carries. The element values are
//! skipped without being interpreted, so the exporter works for any value
//! domain the CRDT stores.

use crate::error::DecodeError;
use crdtdot_store::{Cid, Codec};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Operation counts carried by one delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeltaSummary {
    /// Number of added elements.
    pub added: usize,
    /// Number of tombstones.
    pub removed: usize,
}

/// A decoded block of the causal history.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeltaNode {
    pub id: Cid,
    /// Causal predecessors, in the order the block lists them.
    pub parents: Vec<Cid>,
    /// Height of the block in the DAG.
    pub priority: u64,
    pub summary: DeltaSummary,
}

impl DeltaNode {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[derive(Deserialize)]
struct WireBlock {
    #[serde(default)]
    parents: Vec<Cid>,
    priority: u64,
    #[serde(default)]
    delta: WireDelta,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    elements: Vec<IgnoredAny>,
    #[serde(default)]
    tombstones: Vec<IgnoredAny>,
}

/// Decode the block `bytes` fetched for `id`.
///
/// With `verify` set, the bytes must hash to the identifier's digest.
pub fn decode(id: Cid, bytes: &[u8], verify: bool) -> Result<DeltaNode, DecodeError> {
    if verify && !id.matches(bytes) {
        return Err(DecodeError::DigestMismatch);
    }
    match id.codec() {
        Codec::DagJson => {}
        other => return Err(DecodeError::UnsupportedCodec(other)),
    }

    let wire: WireBlock = serde_json::from_slice(bytes)?;
    Ok(DeltaNode {
        id,
        parents: wire.parents,
        priority: wire.priority,
        summary: DeltaSummary {
            added: wire.delta.elements.len(),
            removed: wire.delta.tombstones.len(),
        },
    })
}

/// A serialized block ready to be stored under its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBlock {
    pub cid: Cid,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct WireBlockOut<'a> {
    parents: &'a [Cid],
    priority: u64,
    delta: WireDeltaOut<'a>,
}

#[derive(Serialize)]
struct WireDeltaOut<'a> {
    elements: &'a [serde_json::Value],
    tombstones: &'a [serde_json::Value],
}

/// Builder for encoded delta blocks.
///
/// Used to seed stores for tests and demos; the exporter itself never
/// writes blocks.
#[derive(Clone, Debug, Default)]
pub struct BlockBuilder {
    parents: Vec<Cid>,
    priority: u64,
    elements: Vec<serde_json::Value>,
    tombstones: Vec<serde_json::Value>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parents(mut self, parents: Vec<Cid>) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_parent(mut self, parent: Cid) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = priority;
        self
    }

    /// Add an element `{ "key": key, "value": value }`.
    pub fn with_element(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.elements.push(serde_json::json!({ "key": key.into(), "value": value }));
        self
    }

    /// Add a tombstone for `key`.
    pub fn with_tombstone(mut self, key: impl Into<String>) -> Self {
        self.tombstones.push(serde_json::json!({ "key": key.into() }));
        self
    }

    /// Serialize the block and compute its identifier.
    pub fn build(self) -> Result<EncodedBlock, serde_json::Error> {
        let bytes = serde_json::to_vec(&WireBlockOut {
            parents: &self.parents,
            priority: self.priority,
            delta: WireDeltaOut {
                elements: &self.elements,
                tombstones: &self.tombstones,
            },
        })?;
        Ok(EncodedBlock {
            cid: Cid::of(Codec::DagJson, &bytes),
            bytes,
        })
    }
}
