/// Victim-edge selection for breaking a detected deadlock.
///
/// Resolution removes one edge of the first reported cycle. The edge is
/// chosen from the detector's per-cycle edge identifiers when they are
/// available, and from the cycle's node sequence otherwise.
///
/// Selection order for [`choose_edge`]:
///
/// 1. The first entry of `cycles_edges[0]` that is the id of an existing
///    edge.
/// 2. Otherwise the first entry. A fallback key `"from->to"` selects the
///    first edge connecting that pair, and when none does nothing is
///    removed. An id that no longer exists falls through to step 3.
/// 3. [`choose_edge_by_nodes`] over the first cycle: the first request edge
///    along the cycle, then the first allocation edge, then any edge.
use petgraph::stable_graph::NodeIndex;

use crate::enums::EdgeKind;
use crate::graph::{CanonicalCycle, DetectionResult, build_graph};
use crate::newtypes::EdgeId;
use crate::structures::{Edge, EdgeRef};

/// The edge picked for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeChoice {
    /// Index of the edge in the slice it was chosen from.
    pub position: usize,
    /// The edge's id, if it has one.
    pub edge_id: Option<EdgeId>,
}

impl EdgeChoice {
    fn at(position: usize, edge: &Edge) -> Self {
        Self {
            position,
            edge_id: edge.id.clone(),
        }
    }
}

/// Picks the edge whose removal breaks the first cycle in `result`.
///
/// Returns `None` when `result` is not deadlocked or no matching edge can be
/// identified; the caller then leaves the graph unchanged.
pub fn choose_edge(result: &DetectionResult, edges: &[Edge]) -> Option<EdgeChoice> {
    if !result.deadlocked {
        return None;
    }

    if let Some(refs) = result.cycles_edges.first().filter(|refs| !refs.is_empty()) {
        if let Some(choice) = refs.iter().find_map(|r| find_by_id(r, edges)) {
            return Some(choice);
        }
        match refs.first() {
            Some(EdgeRef::Key { from, to }) => {
                return edges
                    .iter()
                    .enumerate()
                    .find(|(_, e)| e.connects(from, to))
                    .map(|(pos, e)| EdgeChoice::at(pos, e));
            }
            Some(EdgeRef::Id(stale)) => {
                tracing::debug!(edge_id = %stale, "cycle edge id no longer present");
            }
            None => {}
        }
    }

    result
        .cycles
        .first()
        .and_then(|cycle| choose_edge_by_nodes(cycle, edges))
}

/// Picks an edge of `cycle` by scanning its consecutive node pairs.
///
/// Request edges are preferred over allocation edges, and either over an
/// edge of any kind; within each pass the earliest pair along the cycle wins,
/// and for a pair the earliest edge in `edges`.
pub fn choose_edge_by_nodes(cycle: &CanonicalCycle, edges: &[Edge]) -> Option<EdgeChoice> {
    let graph = build_graph(edges);
    let steps: Vec<(NodeIndex, NodeIndex)> = cycle
        .steps()
        .filter_map(|(from, to)| Some((graph.node_index(from)?, graph.node_index(to)?)))
        .collect();

    let passes: [Option<EdgeKind>; 3] = [Some(EdgeKind::Request), Some(EdgeKind::Allocation), None];
    let weight = passes.into_iter().find_map(|kind| {
        steps
            .iter()
            .find_map(|&(from, to)| graph.first_edge_of_kind(from, to, kind))
    })?;
    edges
        .get(weight.data_index)
        .map(|e| EdgeChoice::at(weight.data_index, e))
}

fn find_by_id(r: &EdgeRef, edges: &[Edge]) -> Option<EdgeChoice> {
    let id = r.as_id()?;
    edges
        .iter()
        .enumerate()
        .find(|(_, e)| e.id.as_ref() == Some(id))
        .map(|(pos, e)| EdgeChoice::at(pos, e))
}
