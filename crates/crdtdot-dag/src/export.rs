//! End-to-end export: check the store, traverse with a deadline, render.

use crate::cancel::CancellationToken;
use crate::error::{CancelReason, ExportError, Result};
use crate::graph::{Graph, GraphStats};
use crate::render::DotRenderer;
use crate::traverse::{TraverseConfig, Traverser};
use crdtdot_store::{BlockAccessor, Cid};
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Options for a single export call.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    pub traverse: TraverseConfig,

    /// Abort the traversal once this much time has passed.
    pub deadline: Option<Duration>,
}

/// Exports the causal history of one replica as a DOT graph.
pub struct Exporter {
    accessor: BlockAccessor,
    traverser: Traverser,
    renderer: DotRenderer,
    deadline: Option<Duration>,
}

impl Exporter {
    pub fn new(accessor: BlockAccessor, options: ExportOptions) -> Self {
        Exporter {
            traverser: Traverser::with_config(accessor.clone(), options.traverse),
            accessor,
            renderer: DotRenderer::new(),
            deadline: options.deadline,
        }
    }

    pub fn with_renderer(mut self, renderer: DotRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Traverse everything reachable from `heads`.
    ///
    /// Fails before reading any block if the store is unavailable, and fails
    /// when the head set is non-empty but not a single block could be read.
    pub async fn collect(&self, heads: &[Cid], cancel: &CancellationToken) -> Result<Graph> {
        let config = self.traverser.config();
        debug!(
            namespace = %self.accessor.namespace().root(),
            concurrency = config.max_concurrent_fetches,
            verify = config.verify_blocks,
            deadline = ?self.deadline,
            "starting export"
        );
        self.accessor
            .check()
            .await
            .map_err(ExportError::StoreUnavailable)?;

        let traversal = self.traverser.traverse(heads, cancel);
        let graph = match self.deadline {
            Some(limit) => tokio::time::timeout(limit, traversal)
                .await
                .map_err(|_| ExportError::Cancelled(CancelReason::Deadline(limit)))??,
            None => traversal.await?,
        };

        if !heads.is_empty() && graph.deltas().next().is_none() {
            return Err(ExportError::NoReadableHeads {
                heads: graph.heads().clone(),
            });
        }
        Ok(graph)
    }

    /// Write `graph` to `out`.
    pub fn render<W: Write>(&self, graph: &Graph, out: W) -> Result<()> {
        let mut out = BufWriter::new(out);
        self.renderer.render(graph, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Collect and render in one call. Nothing is written unless the
    /// traversal completes.
    pub async fn export<W: Write>(
        &self,
        heads: &[Cid],
        cancel: &CancellationToken,
        out: W,
    ) -> Result<GraphStats> {
        let graph = self.collect(heads, cancel).await?;
        self.render(&graph, out)?;

        let stats = graph.stats();
        info!(
            nodes = stats.nodes,
            holes = stats.holes,
            heads = stats.heads,
            edges = stats.edges,
            "exported graph"
        );
        Ok(stats)
    }
}
