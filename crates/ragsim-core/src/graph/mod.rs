/// Graph construction from an edge snapshot using `petgraph`, plus the
/// deadlock cycle engine.
///
/// [`build_graph`] wraps a `StableDiGraph` with typed node and edge weights.
/// Nodes are created lazily the first time an edge names them, so isolated
/// nodes never enter the graph; they are harmless as traversal seeds.
///
/// # Insertion Order
///
/// `StableDiGraph` hands out [`EdgeIndex`] values in insertion order while no
/// edge is removed, and a [`RagGraph`] is never mutated after construction.
/// [`RagGraph::successors`] and [`RagGraph::first_edge`] therefore order by
/// edge index to recover the caller's edge order, which fixes the DFS visit
/// order and the first-match edge tie-break.
///
/// # Cycle Detection
///
/// See the [`cycles`] submodule for the detection pass and [`canonical`] for
/// cycle identity.
pub mod canonical;
pub mod cycles;

pub use canonical::CanonicalCycle;
pub use cycles::{DetectionResult, detect};

use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef as _;

use crate::enums::EdgeKind;
use crate::newtypes::{EdgeId, NodeId};
use crate::structures::Edge;

// ---------------------------------------------------------------------------
// Weight types
// ---------------------------------------------------------------------------

/// Weight stored inline on each petgraph node.
#[derive(Debug, Clone)]
pub struct NodeWeight {
    pub node_id: NodeId,
}

/// Weight stored inline on each petgraph edge.
///
/// `data_index` points back into the edge slice the graph was built from,
/// so a graph lookup can be turned into a position in that slice.
#[derive(Debug, Clone)]
pub struct EdgeWeight {
    /// Explicit id of the originating edge, if it had one.
    pub edge_id: Option<EdgeId>,
    /// Request or allocation, copied from the originating edge.
    pub kind: EdgeKind,
    /// Position of the originating edge in the input slice.
    pub data_index: usize,
}

// ---------------------------------------------------------------------------
// RagGraph
// ---------------------------------------------------------------------------

/// A directed multigraph of processes and resources built from an edge
/// snapshot.
///
/// Parallel edges between the same pair are kept; construct with
/// [`build_graph`].
#[derive(Debug)]
pub struct RagGraph {
    graph: StableDiGraph<NodeWeight, EdgeWeight>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    skipped_edges: usize,
}

impl RagGraph {
    /// Returns the number of distinct nodes named by well-formed edges.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of well-formed edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of input edges skipped because an endpoint was missing.
    pub fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }

    /// Looks up the [`NodeIndex`] for a node identifier.
    ///
    /// Returns `None` if no edge names that node.
    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    /// Returns the identifier stored at `idx`.
    pub fn node_id(&self, idx: NodeIndex) -> Option<&NodeId> {
        self.graph.node_weight(idx).map(|w| &w.node_id)
    }

    /// Returns a reference to the underlying [`StableDiGraph`].
    pub fn graph(&self) -> &StableDiGraph<NodeWeight, EdgeWeight> {
        &self.graph
    }

    /// Destinations of the outgoing edges of `idx`, in edge insertion order.
    ///
    /// A destination reached by several parallel edges appears once per edge.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(idx)
            .map(|e| (e.id(), e.target()))
            .collect();
        out.sort_unstable_by_key(|&(edge, _)| edge);
        out.into_iter().map(|(_, target)| target).collect()
    }

    /// The first-inserted edge from `from` to `to`, if any.
    pub fn first_edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&EdgeWeight> {
        self.first_edge_of_kind(from, to, None)
    }

    /// Like [`first_edge`](Self::first_edge), restricted to edges of `kind`
    /// when one is given.
    pub fn first_edge_of_kind(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        kind: Option<EdgeKind>,
    ) -> Option<&EdgeWeight> {
        self.graph
            .edges(from)
            .filter(|e| e.target() == to && kind.is_none_or(|k| e.weight().kind == k))
            .map(|e| e.id())
            .min()
            .and_then(|edge| self.graph.edge_weight(edge))
    }
}

/// Constructs a [`RagGraph`] from an edge slice in a single left-to-right
/// pass.
///
/// Each well-formed edge interns its endpoints (first appearance order) and
/// is inserted with an [`EdgeWeight`] recording its position in `edges`.
/// Edges lacking either endpoint are skipped and counted; construction never
/// fails.
pub fn build_graph(edges: &[Edge]) -> RagGraph {
    let mut graph: StableDiGraph<NodeWeight, EdgeWeight> =
        StableDiGraph::with_capacity(edges.len(), edges.len());
    let mut id_to_index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut skipped_edges = 0;

    for (data_index, edge) in edges.iter().enumerate() {
        let Some((from, to)) = edge.endpoints() else {
            tracing::debug!(data_index, "skipping edge without both endpoints");
            skipped_edges += 1;
            continue;
        };

        let from_idx = intern(&mut graph, &mut id_to_index, from);
        let to_idx = intern(&mut graph, &mut id_to_index, to);

        graph.add_edge(
            from_idx,
            to_idx,
            EdgeWeight {
                edge_id: edge.id.clone(),
                kind: edge.kind,
                data_index,
            },
        );
    }

    RagGraph {
        graph,
        id_to_index,
        skipped_edges,
    }
}

/// Returns the index for `id`, adding a node the first time it is seen.
fn intern(
    graph: &mut StableDiGraph<NodeWeight, EdgeWeight>,
    id_to_index: &mut HashMap<NodeId, NodeIndex>,
    id: &NodeId,
) -> NodeIndex {
    if let Some(&idx) = id_to_index.get(id) {
        return idx;
    }
    let idx = graph.add_node(NodeWeight {
        node_id: id.clone(),
    });
    id_to_index.insert(id.clone(), idx);
    idx
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::test_helpers::{alloc, eid, idx, p, r, req};

    #[test]
    fn empty_snapshot_builds_empty_graph() {
        let g = build_graph(&[]);
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn nodes_are_interned_once() {
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R1"),
        ];
        let g = build_graph(&edges);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.node_id(idx(&g, "R1")), Some(&r(1)));
    }

    #[test]
    fn malformed_edges_are_skipped_and_counted() {
        let mut orphan = req("e1", "P1", "R1");
        orphan.from = None;
        let mut headless = req("e2", "P1", "R2");
        headless.to = None;
        let edges = vec![orphan, headless, alloc("e3", "R1", "P1")];

        let g = build_graph(&edges);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.skipped_edges(), 2);
        assert!(g.node_index(&r(2)).is_none());
    }

    #[test]
    fn successors_follow_insertion_order() {
        let edges = vec![
            alloc("e1", "R3", "P2"),
            alloc("e2", "R3", "P1"),
            alloc("e3", "R3", "P3"),
        ];
        let g = build_graph(&edges);
        let succ: Vec<&NodeId> = g
            .successors(idx(&g, "R3"))
            .into_iter()
            .filter_map(|i| g.node_id(i))
            .collect();
        assert_eq!(succ, vec![&p(2), &p(1), &p(3)]);
    }

    #[test]
    fn parallel_edges_repeat_successor() {
        let edges = vec![req("e1", "P1", "R1"), req("e2", "P1", "R1")];
        let g = build_graph(&edges);
        assert_eq!(g.successors(idx(&g, "P1")).len(), 2);
    }

    #[test]
    fn first_edge_prefers_earliest_parallel_edge() {
        let edges = vec![
            req("e9", "P1", "R1"),
            alloc("e2", "R1", "P1"),
            req("e4", "P1", "R1"),
        ];
        let g = build_graph(&edges);
        let w = g
            .first_edge(idx(&g, "P1"), idx(&g, "R1"))
            .expect("edge exists");
        assert_eq!(w.edge_id, Some(eid("e9")));
        assert_eq!(w.data_index, 0);
        assert!(g.first_edge(idx(&g, "R1"), idx(&g, "R1")).is_none());
    }

    #[test]
    fn first_edge_of_kind_filters_parallel_edges() {
        let mut broken = req("e0", "P1", "R1");
        broken.to = None;
        let edges = vec![
            broken,
            req("e1", "P1", "R1"),
            alloc("e2", "P1", "R1"),
            alloc("e3", "P1", "R1"),
        ];
        let g = build_graph(&edges);
        let (p1, r1) = (idx(&g, "P1"), idx(&g, "R1"));

        let w = g
            .first_edge_of_kind(p1, r1, Some(EdgeKind::Allocation))
            .expect("allocation exists");
        assert_eq!(w.edge_id, Some(eid("e2")));
        assert_eq!(w.kind, EdgeKind::Allocation);
        assert_eq!(w.data_index, 2);

        let w = g.first_edge_of_kind(p1, r1, None).expect("edge exists");
        assert_eq!(w.data_index, 1);
        assert_eq!(w.kind, EdgeKind::Request);
    }
}
