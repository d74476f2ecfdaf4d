/// Deadlock detection for the resource allocation graph.
///
/// [`detect`] runs a depth-first search seeded by the caller's node order and
/// reports every cycle through two or more distinct processes exactly once,
/// in canonical form, together with the edges that compose it.
///
/// # Algorithm Overview
///
/// The DFS keeps three structures: a visited map, the active path, and a
/// `node → path position` map that doubles as the on-stack set. When a
/// successor is already on the active path, the path slice from that
/// successor to the current node, closed by the successor again, is a raw
/// cycle. Raw cycles pass through registration:
///
/// 1. Cycles with fewer than two distinct processes (`P → R → P` and
///    self-loops) are discarded.
/// 2. The cycle is rotated to its canonical form; a canonical cycle seen
///    before is discarded.
/// 3. Each step `(a, b)` is mapped to the first-inserted `a → b` edge: its
///    id when present, otherwise the fallback key `"a->b"`.
///
/// The traversal uses an explicit stack of `(node, successors, next)` frames,
/// so deep graphs cannot exhaust the call stack. Visit order is identical to
/// the recursive formulation: seeds in caller order, successors in edge
/// insertion order.
use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::graph::canonical::{CanonicalCycle, distinct_processes};
use crate::graph::{RagGraph, build_graph};
use crate::newtypes::NodeId;
use crate::structures::{Edge, EdgeRef};

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Outcome of one detection pass.
///
/// `cycles_edges[i]` lists the edges of `cycles[i]`, one per step, in cycle
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// `true` iff at least one qualifying cycle exists.
    pub deadlocked: bool,
    /// Distinct canonical cycles in order of first discovery.
    pub cycles: Vec<CanonicalCycle>,
    /// Edge identifiers per cycle, parallel to `cycles`.
    pub cycles_edges: Vec<Vec<EdgeRef>>,
}

impl DetectionResult {
    /// The first reported cycle and its edges, if deadlocked.
    pub fn first(&self) -> Option<(&CanonicalCycle, &[EdgeRef])> {
        let cycle = self.cycles.first()?;
        let edges = self.cycles_edges.first().map_or(&[][..], Vec::as_slice);
        Some((cycle, edges))
    }

    /// Every process that lies on at least one reported cycle, in order of
    /// first appearance.
    pub fn deadlocked_processes(&self) -> Vec<&NodeId> {
        let mut out: Vec<&NodeId> = Vec::new();
        for node in self.cycles.iter().flat_map(CanonicalCycle::core) {
            if node.is_process() && !out.contains(&node) {
                out.push(node);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detects deadlock cycles in the snapshot `edges`, seeding the DFS from
/// `nodes` in order.
///
/// Never fails: malformed edges are skipped and an empty snapshot yields an
/// empty result. Seeds that no edge names are ignored. Endpoints absent from
/// `nodes` are still reached through edges; `nodes` only controls seed
/// order.
///
/// For fixed inputs the result is fully reproducible.
pub fn detect(edges: &[Edge], nodes: &[NodeId]) -> DetectionResult {
    let graph = build_graph(edges);
    let mut registry = CycleRegistry::default();

    let mut search = Search::new(&graph);
    for seed in nodes {
        let Some(start) = graph.node_index(seed) else {
            continue;
        };
        search.run_from(start, |raw| registry.register(&graph, raw));
    }

    let result = registry.finish();
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped_edges = graph.skipped_edges(),
        cycles = result.cycles.len(),
        "deadlock detection finished"
    );
    result
}

// ---------------------------------------------------------------------------
// Internal: iterative DFS
// ---------------------------------------------------------------------------

/// One DFS frame: the node, its successors, and the next successor to try.
struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

/// DFS state shared across all seeds of one detection pass.
struct Search<'g> {
    graph: &'g RagGraph,
    visited: HashSet<NodeIndex>,
    path: Vec<NodeIndex>,
    on_path: HashMap<NodeIndex, usize>,
}

impl<'g> Search<'g> {
    fn new(graph: &'g RagGraph) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
            path: Vec::new(),
            on_path: HashMap::new(),
        }
    }

    /// Explores everything reachable from `start` that is not yet visited,
    /// handing each closed raw cycle to `on_cycle`.
    fn run_from(&mut self, start: NodeIndex, mut on_cycle: impl FnMut(&[NodeIndex])) {
        if self.visited.contains(&start) {
            return;
        }

        let mut stack: Vec<Frame> = vec![self.enter(start)];

        while let Some(frame) = stack.last_mut() {
            let Some(&child) = frame.successors.get(frame.next) else {
                // All successors explored: backtrack.
                let node = frame.node;
                stack.pop();
                self.path.pop();
                self.on_path.remove(&node);
                continue;
            };
            frame.next += 1;

            if !self.visited.contains(&child) {
                let child_frame = self.enter(child);
                stack.push(child_frame);
            } else if let Some(&pos) = self.on_path.get(&child) {
                // Back edge: the path from `child` onward, closed by `child`.
                let mut raw: Vec<NodeIndex> = self.path.get(pos..).unwrap_or_default().to_vec();
                raw.push(child);
                on_cycle(&raw);
            }
        }
    }

    /// Marks `node` visited, pushes it on the active path and builds its frame.
    fn enter(&mut self, node: NodeIndex) -> Frame {
        self.visited.insert(node);
        self.on_path.insert(node, self.path.len());
        self.path.push(node);
        Frame {
            node,
            successors: self.graph.successors(node),
            next: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal: cycle registration
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CycleRegistry {
    seen: HashSet<CanonicalCycle>,
    cycles: Vec<CanonicalCycle>,
    cycles_edges: Vec<Vec<EdgeRef>>,
}

impl CycleRegistry {
    /// Validates, canonicalizes and records a closed raw cycle.
    fn register(&mut self, graph: &RagGraph, raw: &[NodeIndex]) {
        let closed: Vec<NodeId> = raw
            .iter()
            .filter_map(|&idx| graph.node_id(idx).cloned())
            .collect();
        let Some((_, core)) = closed.split_last() else {
            return;
        };

        if distinct_processes(core) <= 1 {
            tracing::trace!(cycle = ?closed, "discarding single-process cycle");
            return;
        }

        let Some(canonical) = CanonicalCycle::from_closed(&closed) else {
            return;
        };
        if self.seen.contains(&canonical) {
            return;
        }

        let edges: Vec<EdgeRef> = canonical
            .steps()
            .map(|(a, b)| edge_ref(graph, a, b))
            .collect();

        tracing::trace!(cycle = %canonical, "registered deadlock cycle");
        self.seen.insert(canonical.clone());
        self.cycles.push(canonical);
        self.cycles_edges.push(edges);
    }

    fn finish(self) -> DetectionResult {
        DetectionResult {
            deadlocked: !self.cycles.is_empty(),
            cycles: self.cycles,
            cycles_edges: self.cycles_edges,
        }
    }
}

/// Identifies the first-inserted edge `a → b`, falling back to the key.
fn edge_ref(graph: &RagGraph, a: &NodeId, b: &NodeId) -> EdgeRef {
    let first = graph
        .node_index(a)
        .zip(graph.node_index(b))
        .and_then(|(ai, bi)| graph.first_edge(ai, bi));
    match first.and_then(|w| w.edge_id.clone()) {
        Some(id) => EdgeRef::Id(id),
        None => EdgeRef::Key {
            from: a.clone(),
            to: b.clone(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::test_helpers::{
        alloc, anon_alloc, anon_req, eid, minimal_deadlock, nodes, req,
    };

    fn cycle_names(result: &DetectionResult) -> Vec<String> {
        result.cycles.iter().map(ToString::to_string).collect()
    }

    fn edge_names(result: &DetectionResult, i: usize) -> Vec<String> {
        result.cycles_edges[i].iter().map(ToString::to_string).collect()
    }

    // -----------------------------------------------------------------------
    // No cycles
    // -----------------------------------------------------------------------

    #[test]
    fn empty_snapshot_is_not_deadlocked() {
        let result = detect(&[], &[]);
        assert!(!result.deadlocked);
        assert!(result.cycles.is_empty());
        assert!(result.cycles_edges.is_empty());
    }

    #[test]
    fn isolated_seeds_are_harmless() {
        let result = detect(&[], &nodes(&["P1", "P2", "R1"]));
        assert_eq!(result, DetectionResult::default());
    }

    #[test]
    fn chain_without_cycle() {
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R2"),
        ];
        let result = detect(&edges, &nodes(&["P1", "P2", "R1", "R2"]));
        assert!(!result.deadlocked);
    }

    // -----------------------------------------------------------------------
    // Trivial cycle suppression
    // -----------------------------------------------------------------------

    #[test]
    fn single_process_cycle_is_discarded() {
        let edges = vec![req("e1", "P1", "R1"), alloc("e2", "R1", "P1")];
        for order in [["P1", "R1"], ["R1", "P1"]] {
            let result = detect(&edges, &nodes(&order));
            assert!(!result.deadlocked, "order {order:?}");
        }
    }

    #[test]
    fn single_process_through_two_resources_is_discarded() {
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P1"),
            req("e3", "P1", "R2"),
            alloc("e4", "R2", "P1"),
        ];
        let result = detect(&edges, &nodes(&["P1", "R1", "R2"]));
        assert!(!result.deadlocked);
    }

    #[test]
    fn self_loop_is_discarded() {
        let edges = vec![req("e1", "P1", "P1")];
        let result = detect(&edges, &nodes(&["P1"]));
        assert!(!result.deadlocked);
    }

    // -----------------------------------------------------------------------
    // Real deadlocks
    // -----------------------------------------------------------------------

    #[test]
    fn minimal_two_process_deadlock() {
        let result = detect(&minimal_deadlock(), &nodes(&["P1", "P2", "R1", "R2"]));
        assert!(result.deadlocked);
        assert_eq!(cycle_names(&result), vec!["P1 → R1 → P2 → R2 → P1"]);
        assert_eq!(edge_names(&result, 0), vec!["e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn canonical_form_is_independent_of_seed_order() {
        let edges = minimal_deadlock();
        let orders = [
            ["P1", "P2", "R1", "R2"],
            ["R2", "R1", "P2", "P1"],
            ["P2", "R1", "P1", "R2"],
            ["R1", "P1", "R2", "P2"],
        ];
        for order in orders {
            let result = detect(&edges, &nodes(&order));
            assert_eq!(
                cycle_names(&result),
                vec!["P1 → R1 → P2 → R2 → P1"],
                "order {order:?}"
            );
            assert_eq!(edge_names(&result, 0), vec!["e1", "e2", "e3", "e4"]);
        }
    }

    #[test]
    fn endpoints_missing_from_seed_list_are_still_reached() {
        let result = detect(&minimal_deadlock(), &nodes(&["P1"]));
        assert!(result.deadlocked);
    }

    #[test]
    fn seed_not_reaching_cycle_finds_nothing() {
        let mut edges = minimal_deadlock();
        edges.push(req("e5", "P3", "R3"));
        let result = detect(&edges, &nodes(&["P3", "R3"]));
        assert!(!result.deadlocked);
    }

    #[test]
    fn three_process_ring() {
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R2"),
            alloc("e4", "R2", "P3"),
            req("e5", "P3", "R3"),
            alloc("e6", "R3", "P1"),
        ];
        let result = detect(&edges, &nodes(&["P3", "P2", "P1", "R1", "R2", "R3"]));
        assert_eq!(
            cycle_names(&result),
            vec!["P1 → R1 → P2 → R2 → P3 → R3 → P1"]
        );
        assert_eq!(
            edge_names(&result, 0),
            vec!["e1", "e2", "e3", "e4", "e5", "e6"]
        );
    }

    #[test]
    fn two_disjoint_deadlocks_without_cross_contamination() {
        let mut edges = minimal_deadlock();
        edges.extend([
            req("e5", "P3", "R3"),
            alloc("e6", "R3", "P4"),
            req("e7", "P4", "R4"),
            alloc("e8", "R4", "P3"),
        ]);
        let result = detect(
            &edges,
            &nodes(&["P1", "P2", "P3", "P4", "R1", "R2", "R3", "R4"]),
        );
        assert_eq!(
            cycle_names(&result),
            vec!["P1 → R1 → P2 → R2 → P1", "P3 → R3 → P4 → R4 → P3"]
        );
        assert_eq!(edge_names(&result, 0), vec!["e1", "e2", "e3", "e4"]);
        assert_eq!(edge_names(&result, 1), vec!["e5", "e6", "e7", "e8"]);
    }

    #[test]
    fn discovery_order_follows_seed_order() {
        let mut edges = minimal_deadlock();
        edges.extend([
            req("e5", "P3", "R3"),
            alloc("e6", "R3", "P4"),
            req("e7", "P4", "R4"),
            alloc("e8", "R4", "P3"),
        ]);
        let result = detect(&edges, &nodes(&["P4", "P1"]));
        assert_eq!(
            cycle_names(&result),
            vec!["P3 → R3 → P4 → R4 → P3", "P1 → R1 → P2 → R2 → P1"]
        );
    }

    #[test]
    fn overlapping_cycles_sharing_a_resource() {
        // P1 and P3 both wait on R1 held by P2; P2 waits on R2 held by P1
        // and on R3 held by P3.
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R2"),
            alloc("e4", "R2", "P1"),
            req("e5", "P2", "R3"),
            alloc("e6", "R3", "P3"),
            req("e7", "P3", "R1"),
        ];
        let result = detect(&edges, &nodes(&["P1", "P2", "P3", "R1", "R2", "R3"]));
        assert_eq!(
            cycle_names(&result),
            vec!["P1 → R1 → P2 → R2 → P1", "P2 → R3 → P3 → R1 → P2"]
        );
        assert_eq!(edge_names(&result, 1), vec!["e5", "e6", "e7", "e2"]);
    }

    // -----------------------------------------------------------------------
    // Edge identity mapping
    // -----------------------------------------------------------------------

    #[test]
    fn edges_without_ids_fall_back_to_keys() {
        let edges = vec![
            anon_req("P1", "R1"),
            anon_alloc("R1", "P2"),
            anon_req("P2", "R2"),
            alloc("e4", "R2", "P1"),
        ];
        let result = detect(&edges, &nodes(&["P1", "P2", "R1", "R2"]));
        assert_eq!(
            edge_names(&result, 0),
            vec!["P1->R1", "R1->P2", "P2->R2", "e4"]
        );
        assert_eq!(result.cycles_edges[0][3].as_id(), Some(&eid("e4")));
    }

    #[test]
    fn duplicate_edges_report_cycle_once_with_first_id() {
        let mut edges = minimal_deadlock();
        edges.push(req("e9", "P1", "R1"));
        let result = detect(&edges, &nodes(&["P1", "P2", "R1", "R2"]));
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(edge_names(&result, 0), vec!["e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn first_inserted_duplicate_wins_even_if_id_sorts_later() {
        let edges = vec![
            req("z9", "P1", "R1"),
            req("a1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R2"),
            alloc("e4", "R2", "P1"),
        ];
        let result = detect(&edges, &nodes(&["P1"]));
        assert_eq!(edge_names(&result, 0)[0], "z9");
    }

    // -----------------------------------------------------------------------
    // Robustness
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_edges_do_not_break_detection() {
        let mut edges = minimal_deadlock();
        let mut broken = req("e5", "P2", "R1");
        broken.from = None;
        edges.insert(0, broken);
        let result = detect(&edges, &nodes(&["P1", "P2", "R1", "R2"]));
        assert_eq!(result.cycles.len(), 1);
    }

    #[test]
    fn mistagged_endpoint_joins_the_same_node() {
        use crate::enums::NodeKind;

        let mut edges = minimal_deadlock();
        edges[3].to = Some(NodeId::new(NodeKind::Resource, "P1").expect("valid"));
        let result = detect(&edges, &nodes(&["P1"]));
        assert!(result.deadlocked);
        assert_eq!(cycle_names(&result), vec!["P1 → R1 → P2 → R2 → P1"]);
        assert_eq!(edge_names(&result, 0), vec!["e1", "e2", "e3", "e4"]);

        let graph = build_graph(&edges);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn repeated_detection_is_identical() {
        let edges = minimal_deadlock();
        let seeds = nodes(&["P2", "R1", "P1", "R2"]);
        let first = serde_json::to_string(&detect(&edges, &seeds)).expect("serialize");
        let second = serde_json::to_string(&detect(&edges, &seeds)).expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn long_chain_does_not_overflow_the_stack() {
        // P0 → R0 → P1 → R1 → … → P(n-1) → R(n-1) → P0
        let n = 20_000;
        let mut edges = Vec::with_capacity(2 * n);
        for i in 0..n {
            edges.push(Edge::request(None, NodeId::process(i), NodeId::resource(i)));
            edges.push(Edge::allocation(
                None,
                NodeId::resource(i),
                NodeId::process((i + 1) % n),
            ));
        }
        let result = detect(&edges, &[NodeId::process(0)]);
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(result.cycles[0].len(), 2 * n);
    }

    #[test]
    fn result_serializes_with_snake_case_fields() {
        let result = detect(&minimal_deadlock(), &nodes(&["P1"]));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "deadlocked": true,
                "cycles": [["P1", "R1", "P2", "R2", "P1"]],
                "cycles_edges": [["e1", "e2", "e3", "e4"]],
            })
        );
    }

    #[test]
    fn deadlocked_processes_are_collected_once() {
        let edges = vec![
            req("e1", "P1", "R1"),
            alloc("e2", "R1", "P2"),
            req("e3", "P2", "R2"),
            alloc("e4", "R2", "P1"),
            req("e5", "P2", "R3"),
            alloc("e6", "R3", "P3"),
            req("e7", "P3", "R1"),
        ];
        let result = detect(&edges, &nodes(&["P1"]));
        let procs: Vec<String> = result
            .deadlocked_processes()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(procs, vec!["P1", "P2", "P3"]);
        let (first, first_edges) = result.first().expect("deadlocked");
        assert_eq!(first.len(), first_edges.len());
    }
}
