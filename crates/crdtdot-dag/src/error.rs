//! Error types for decoding and exporting.

use crdtdot_store::{Cid, Codec, StoreError};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a fetched block could not be turned into a delta node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed block: {0}")]
    Malformed(String),

    #[error("content digest does not match identifier")]
    DigestMismatch,

    #[error("codec {} carries no delta", .0.name())]
    UnsupportedCodec(Codec),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// What stopped an export early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Signal,
    /// The configured deadline elapsed.
    Deadline(Duration),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Signal => write!(f, "cancelled"),
            CancelReason::Deadline(d) => write!(f, "deadline of {:?} exceeded", d),
        }
    }
}

/// Top-level failures of an export. Per-block problems never show up here;
/// they become holes in the graph.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot export from this store")]
    StoreUnavailable(#[source] StoreError),

    #[error("export aborted: {0}")]
    Cancelled(CancelReason),

    #[error("none of the {} head(s) could be read", heads.len())]
    NoReadableHeads { heads: BTreeSet<Cid> },

    #[error("failed to write graph: {0}")]
    Output(#[from] std::io::Error),

    #[error("fetch task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;
