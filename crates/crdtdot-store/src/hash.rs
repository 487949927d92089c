//! SHA-256 digests used as the content half of a block identifier.

use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a digest in bytes.
pub const HASH_LEN: usize = 32;

/// A 32-byte SHA-256 digest of a block's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// Digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(&Sha256::digest(data));
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, 64 characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Parse the 64 character lowercase hex form produced by [`to_hex`](Hash::to_hex).
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != HASH_LEN * 2 || !s.bytes().all(is_lower_hex) {
            return None;
        }
        let mut bytes = [0u8; HASH_LEN];
        for (slot, chunk) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(chunk).ok()?;
            *slot = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Hash(bytes))
    }

    /// First 8 hex characters, for labels and log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

pub(crate) fn is_lower_hex(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'f')
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}...)", self.short())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
