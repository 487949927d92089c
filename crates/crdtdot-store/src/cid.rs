//! Content identifiers.
//!
//! A [`Cid`] pairs a [`Codec`] tag with the SHA-256 digest of the block
//! bytes. Its canonical text form is the codec tag as 4 hex digits followed
//! by the 64 hex digits of the digest, e.g.
//!
//! ```text
//! 0129 ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
//! ```
//!
//! (without the space). Fixed width means that sorting identifiers and
//! sorting their text gives the same order.

use crate::hash::{is_lower_hex, Hash, HASH_LEN};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CODEC_HEX_LEN: usize = 4;

/// Length of a canonical CID string.
pub const CID_STR_LEN: usize = CODEC_HEX_LEN + HASH_LEN * 2;

/// Encoding of the bytes a CID points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Opaque bytes.
    Raw,
    /// A JSON-encoded delta block.
    DagJson,
}

impl Codec {
    pub fn tag(self) -> u16 {
        match self {
            Codec::Raw => 0x0055,
            Codec::DagJson => 0x0129,
        }
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0x0055 => Some(Codec::Raw),
            0x0129 => Some(Codec::DagJson),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::Raw => "raw",
            Codec::DagJson => "dag-json",
        }
    }
}

/// Why a string is not a valid CID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidParseError {
    #[error("expected 68 characters, found {0}")]
    Length(usize),

    #[error("invalid hex in identifier")]
    InvalidHex,

    #[error("unknown codec tag {0:#06x}")]
    UnknownCodec(u16),
}

/// Content identifier of a block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid {
    codec: Codec,
    hash: Hash,
}

impl Cid {
    pub fn new(codec: Codec, hash: Hash) -> Self {
        Cid { codec, hash }
    }

    /// Identify `bytes` encoded with `codec`.
    pub fn of(codec: Codec, bytes: &[u8]) -> Self {
        Cid::new(codec, Hash::of(bytes))
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// True when `bytes` hash to this identifier's digest.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        Hash::of(bytes) == self.hash
    }

    /// Truncated digest for labels.
    pub fn short(&self) -> String {
        self.hash.short()
    }
}

impl Ord for Cid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.codec
            .tag()
            .cmp(&other.codec.tag())
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for Cid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}{}", self.codec.tag(), self.hash)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({}:{})", self.codec.name(), self.hash.short())
    }
}

impl FromStr for Cid {
    type Err = CidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CID_STR_LEN {
            return Err(CidParseError::Length(s.len()));
        }
        if !s.bytes().all(is_lower_hex) {
            return Err(CidParseError::InvalidHex);
        }
        let (tag, digest) = s.split_at(CODEC_HEX_LEN);
        let tag = u16::from_str_radix(tag, 16).map_err(|_| CidParseError::InvalidHex)?;
        let codec = Codec::from_tag(tag).ok_or(CidParseError::UnknownCodec(tag))?;
        let hash = Hash::from_hex(digest).ok_or(CidParseError::InvalidHex)?;
        Ok(Cid::new(codec, hash))
    }
}

impl TryFrom<String> for Cid {
    type Error = CidParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.to_string()
    }
}
