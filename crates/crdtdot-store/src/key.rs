//! Hierarchical datastore keys and the per-replica namespace layout.
//!
//! ```text
//! <namespace>/b/<cid>   serialized delta block
//! <namespace>/h/<cid>   head marker
//! ```

use crate::cid::Cid;
use serde::{Deserialize, Serialize};
use std::fmt;

const BLOCKS_SEGMENT: &str = "b";
const HEADS_SEGMENT: &str = "h";

/// A `/`-separated datastore key, always absolute and without a trailing
/// slash. The root key is `/`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Build a key, cleaning up duplicate, leading and trailing slashes.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let segments: Vec<&str> = raw
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        Key(format!("/{}", segments.join("/")))
    }

    pub fn root() -> Self {
        Key("/".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Append one or more segments.
    pub fn child(&self, name: impl AsRef<str>) -> Self {
        Key::new(format!("{}/{}", self.0, name.as_ref()))
    }

    /// Last path segment, empty for the root key.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// True when `self` lies strictly below `prefix`.
    pub fn is_descendant_of(&self, prefix: &Key) -> bool {
        if prefix.is_root() {
            return !self.is_root();
        }
        self.0.len() > prefix.0.len()
            && self.0.starts_with(&prefix.0)
            && self.0.as_bytes()[prefix.0.len()] == b'/'
    }

    /// Path segments without the leading slash.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

/// Prefix isolating one replica's CRDT data from everything else in the
/// store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    root: Key,
}

impl Namespace {
    pub fn new(root: impl AsRef<str>) -> Self {
        Namespace {
            root: Key::new(root),
        }
    }

    pub fn root(&self) -> &Key {
        &self.root
    }

    pub fn blocks_prefix(&self) -> Key {
        self.root.child(BLOCKS_SEGMENT)
    }

    pub fn heads_prefix(&self) -> Key {
        self.root.child(HEADS_SEGMENT)
    }

    pub fn block_key(&self, cid: &Cid) -> Key {
        self.blocks_prefix().child(cid.to_string())
    }

    pub fn head_key(&self, cid: &Cid) -> Key {
        self.heads_prefix().child(cid.to_string())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new("/crdt")
    }
}
