//! Deduplicated reachability traversal over parent links.
//!
//! The traverser keeps a frontier of claimed-but-unfetched identifiers and
//! runs up to `max_concurrent_fetches` fetch tasks at once. Each task
//! fetches and decodes one block, then claims that block's parents in the
//! shared [`VisitedSet`]; only the parents it won come back to the frontier.
//! A block reachable through several children is therefore fetched exactly
//! once, while every child still gets its own edge.

use crate::cancel::CancellationToken;
use crate::codec::{self, DeltaNode};
use crate::error::{CancelReason, ExportError, Result};
use crate::graph::{Graph, HoleReason};
use crate::visited::VisitedSet;
use crdtdot_store::{BlockAccessor, Cid, StoreError};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Configuration for the traverser.
#[derive(Clone, Debug)]
pub struct TraverseConfig {
    /// Upper bound on in-flight block fetches.
    pub max_concurrent_fetches: usize,

    /// Check that fetched bytes hash to the requested identifier.
    pub verify_blocks: bool,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        TraverseConfig {
            max_concurrent_fetches: 16,
            verify_blocks: true,
        }
    }
}

/// Builder for traversal configuration.
pub struct TraverseConfigBuilder {
    config: TraverseConfig,
}

impl TraverseConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TraverseConfig::default(),
        }
    }

    /// Values below 1 are raised to 1.
    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.config.max_concurrent_fetches = n.max(1);
        self
    }

    pub fn verify_blocks(mut self, enabled: bool) -> Self {
        self.config.verify_blocks = enabled;
        self
    }

    pub fn build(self) -> TraverseConfig {
        self.config
    }
}

impl Default for TraverseConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of visiting one claimed identifier.
enum Outcome {
    Decoded {
        node: DeltaNode,
        /// Parents this visit claimed; they still need fetching.
        claimed: Vec<Cid>,
    },
    Hole(HoleReason),
    /// The store stopped serving reads.
    Fatal(StoreError),
}

/// Walks the causal history reachable from a head set.
pub struct Traverser {
    accessor: BlockAccessor,
    config: TraverseConfig,
}

impl Traverser {
    pub fn new(accessor: BlockAccessor) -> Self {
        Self::with_config(accessor, TraverseConfig::default())
    }

    pub fn with_config(accessor: BlockAccessor, config: TraverseConfig) -> Self {
        Traverser { accessor, config }
    }

    pub fn config(&self) -> &TraverseConfig {
        &self.config
    }

    /// Collect every block reachable from `heads`.
    ///
    /// Missing and undecodable blocks become holes. The call fails only when
    /// the store becomes unavailable or `cancel` fires; in both cases the
    /// partial graph is dropped.
    pub async fn traverse(&self, heads: &[Cid], cancel: &CancellationToken) -> Result<Graph> {
        let limit = self.config.max_concurrent_fetches.max(1);
        let visited = Arc::new(VisitedSet::new());
        let mut graph = Graph::new(heads.iter().copied());
        let mut frontier: VecDeque<Cid> = heads
            .iter()
            .copied()
            .filter(|h| visited.claim(*h))
            .collect();
        let mut tasks: JoinSet<(Cid, Outcome)> = JoinSet::new();

        info!(heads = frontier.len(), concurrency = limit, "traversing causal history");

        loop {
            while tasks.len() < limit {
                let Some(cid) = frontier.pop_front() else {
                    break;
                };
                let accessor = self.accessor.clone();
                let visited = Arc::clone(&visited);
                let verify = self.config.verify_blocks;
                tasks.spawn(async move {
                    let outcome = visit(&accessor, &visited, cid, verify).await;
                    (cid, outcome)
                });
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(ExportError::Cancelled(CancelReason::Signal));
                }
                joined = tasks.join_next() => joined,
            };

            // Nothing in flight and nothing queued.
            let Some(joined) = joined else {
                break;
            };

            let (cid, outcome) = joined.map_err(|e| ExportError::Worker(e.to_string()))?;
            match outcome {
                Outcome::Decoded { node, claimed } => {
                    debug!(
                        cid = %cid,
                        priority = node.priority,
                        parents = node.parents.len(),
                        "visited"
                    );
                    frontier.extend(claimed);
                    graph.insert_delta(node);
                }
                Outcome::Hole(reason) => {
                    warn!(
                        cid = %cid,
                        reason = reason.tag(),
                        detail = reason.detail().unwrap_or(""),
                        "recording hole"
                    );
                    graph.insert_hole(cid, reason);
                }
                Outcome::Fatal(err) => {
                    tasks.abort_all();
                    return Err(ExportError::StoreUnavailable(err));
                }
            }
        }

        let violations = graph.priority_violations();
        for edge in &violations {
            warn!(child = %edge.child, parent = %edge.parent, "priority decreases along edge");
        }

        let stats = graph.stats();
        info!(
            nodes = stats.nodes,
            holes = stats.holes,
            edges = stats.edges,
            claimed = visited.len(),
            priority_violations = violations.len(),
            "traversal complete"
        );
        Ok(graph)
    }
}

async fn visit(accessor: &BlockAccessor, visited: &VisitedSet, cid: Cid, verify: bool) -> Outcome {
    let bytes = match accessor.fetch(&cid).await {
        Ok(bytes) => bytes,
        Err(StoreError::NotFound(_)) => return Outcome::Hole(HoleReason::Missing),
        Err(err) if err.is_fatal() => return Outcome::Fatal(err),
        Err(err) => return Outcome::Hole(HoleReason::Unreadable(err.to_string())),
    };

    match codec::decode(cid, &bytes, verify) {
        Ok(node) => {
            let claimed = node.parents.iter().copied().filter(|p| visited.claim(*p)).collect();
            Outcome::Decoded { node, claimed }
        }
        Err(err) => Outcome::Hole(HoleReason::Corrupt(err.to_string())),
    }
}
