//! The traversal result: decoded nodes, holes and parent edges.
//!
//! Vertices and edges live in ordered collections keyed by identifier, so
//! iteration order depends only on the graph's contents and never on the
//! order the traversal discovered them in.

use crate::codec::DeltaNode;
use crdtdot_store::Cid;
use std::collections::{BTreeMap, BTreeSet};

/// Why a referenced block is absent from the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HoleReason {
    /// The store has no block under the identifier (pruned or never synced).
    Missing,
    /// Bytes were fetched but did not decode.
    Corrupt(String),
    /// The store failed to read this one block.
    Unreadable(String),
}

impl HoleReason {
    /// Short tag used in rendered output.
    pub fn tag(&self) -> &'static str {
        match self {
            HoleReason::Missing => "missing",
            HoleReason::Corrupt(_) => "corrupt",
            HoleReason::Unreadable(_) => "unreadable",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            HoleReason::Missing => None,
            HoleReason::Corrupt(d) | HoleReason::Unreadable(d) => Some(d),
        }
    }
}

/// A vertex of the exported graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Vertex {
    Delta(DeltaNode),
    Hole(HoleReason),
}

impl Vertex {
    pub fn as_delta(&self) -> Option<&DeltaNode> {
        match self {
            Vertex::Delta(node) => Some(node),
            Vertex::Hole(_) => None,
        }
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, Vertex::Hole(_))
    }
}

/// A parent link, pointing from a block to one of its causal predecessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub child: Cid,
    pub parent: Cid,
}

/// Summary counts for a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Decoded delta nodes.
    pub nodes: usize,
    pub holes: usize,
    pub heads: usize,
    pub edges: usize,
    /// Highest priority among decoded nodes.
    pub max_priority: Option<u64>,
}

/// Reachable causal history of a head set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    heads: BTreeSet<Cid>,
    vertices: BTreeMap<Cid, Vertex>,
    edges: BTreeSet<Edge>,
}

impl Graph {
    /// An empty graph for the given heads.
    pub fn new(heads: impl IntoIterator<Item = Cid>) -> Self {
        Graph {
            heads: heads.into_iter().collect(),
            vertices: BTreeMap::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Record a decoded node and one edge per parent.
    pub(crate) fn insert_delta(&mut self, node: DeltaNode) {
        for parent in &node.parents {
            self.edges.insert(Edge {
                child: node.id,
                parent: *parent,
            });
        }
        self.vertices.insert(node.id, Vertex::Delta(node));
    }

    pub(crate) fn insert_hole(&mut self, cid: Cid, reason: HoleReason) {
        self.vertices.insert(cid, Vertex::Hole(reason));
    }

    pub fn heads(&self) -> &BTreeSet<Cid> {
        &self.heads
    }

    pub fn is_head(&self, cid: &Cid) -> bool {
        self.heads.contains(cid)
    }

    pub fn get(&self, cid: &Cid) -> Option<&Vertex> {
        self.vertices.get(cid)
    }

    /// All vertices, sorted by identifier.
    pub fn vertices(&self) -> impl Iterator<Item = (&Cid, &Vertex)> {
        self.vertices.iter()
    }

    /// All decoded nodes, sorted by identifier.
    pub fn deltas(&self) -> impl Iterator<Item = &DeltaNode> {
        self.vertices.values().filter_map(Vertex::as_delta)
    }

    /// All holes, sorted by identifier.
    pub fn holes(&self) -> impl Iterator<Item = (&Cid, &HoleReason)> {
        self.vertices.iter().filter_map(|(cid, v)| match v {
            Vertex::Hole(reason) => Some((cid, reason)),
            Vertex::Delta(_) => None,
        })
    }

    /// All edges, sorted by child then parent.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges whose child has a lower priority than its parent.
    ///
    /// Priorities must not decrease from a parent to its child; equal
    /// priorities are accepted. Edges touching a hole are not checked.
    pub fn priority_violations(&self) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|edge| {
                let child = self.get(&edge.child).and_then(Vertex::as_delta);
                let parent = self.get(&edge.parent).and_then(Vertex::as_delta);
                matches!((child, parent), (Some(c), Some(p)) if c.priority < p.priority)
            })
            .copied()
            .collect()
    }

    /// Parents referenced by an edge but absent from the vertex set.
    ///
    /// Empty for every graph produced by a completed traversal.
    pub fn dangling_parents(&self) -> BTreeSet<Cid> {
        self.edges
            .iter()
            .map(|e| e.parent)
            .filter(|p| !self.vertices.contains_key(p))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.deltas().count(),
            holes: self.holes().count(),
            heads: self.heads.len(),
            edges: self.edges.len(),
            max_priority: self.deltas().map(|n| n.priority).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DeltaSummary;
    use crdtdot_store::Codec;

    fn cid(tag: &str) -> Cid {
        Cid::of(Codec::DagJson, tag.as_bytes())
    }

    fn node(id: Cid, parents: Vec<Cid>, priority: u64) -> DeltaNode {
        DeltaNode {
            id,
            parents,
            priority,
            summary: DeltaSummary { added: 1, removed: 0 },
        }
    }

    #[test]
    fn test_insert_delta_adds_edges() {
        let (a, b, c) = (cid("a"), cid("b"), cid("c"));
        let mut graph = Graph::new([a]);
        graph.insert_delta(node(a, vec![b, c], 3));

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dangling_parents(), BTreeSet::from([b, c]));

        graph.insert_delta(node(b, vec![], 1));
        graph.insert_hole(c, HoleReason::Missing);
        assert!(graph.dangling_parents().is_empty());
        assert!(graph.get(&c).unwrap().is_hole());
    }

    #[test]
    fn test_duplicate_parent_links_collapse() {
        let (a, b) = (cid("a"), cid("b"));
        let mut graph = Graph::new([a]);
        graph.insert_delta(node(a, vec![b, b], 2));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let cids: Vec<Cid> = (0..10).map(|i| cid(&i.to_string())).collect();
        let mut graph = Graph::default();
        for c in cids.iter().rev() {
            graph.insert_delta(node(*c, vec![], 1));
        }
        let seen: Vec<Cid> = graph.vertices().map(|(c, _)| *c).collect();
        let mut expected = cids.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_priority_violations() {
        let (a, b, c, d) = (cid("a"), cid("b"), cid("c"), cid("d"));
        let mut graph = Graph::new([a]);
        graph.insert_delta(node(a, vec![b, c, d], 2));
        graph.insert_delta(node(b, vec![], 2)); // equal: accepted
        graph.insert_delta(node(c, vec![], 5)); // parent above child: violation
        graph.insert_hole(d, HoleReason::Corrupt("bad".into()));

        assert_eq!(graph.priority_violations(), vec![Edge { child: a, parent: c }]);
    }

    #[test]
    fn test_stats() {
        let (a, b) = (cid("a"), cid("b"));
        let mut graph = Graph::new([a]);
        graph.insert_delta(node(a, vec![b], 7));
        graph.insert_hole(b, HoleReason::Missing);

        assert_eq!(
            graph.stats(),
            GraphStats {
                nodes: 1,
                holes: 1,
                heads: 1,
                edges: 1,
                max_priority: Some(7),
            }
        );
        assert_eq!(Graph::default().stats().max_priority, None);
    }

    #[test]
    fn test_hole_reason_tags() {
        assert_eq!(HoleReason::Missing.tag(), "missing");
        assert_eq!(HoleReason::Missing.detail(), None);
        let corrupt = HoleReason::Corrupt("eof".into());
        assert_eq!(corrupt.tag(), "corrupt");
        assert_eq!(corrupt.detail(), Some("eof"));
        assert_eq!(HoleReason::Unreadable("io".into()).tag(), "unreadable");
    }
}
