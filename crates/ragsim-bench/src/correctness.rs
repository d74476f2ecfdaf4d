//! Post-operation invariant checkers for correctness validation.

use std::collections::{HashMap, HashSet};

use petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use ragsim_core::{CanonicalCycle, DetectionResult, Edge, EdgeId, EdgeRef, RagGraph};

/// Verifies graph construction invariants.
pub fn check_graph_invariants(edges: &[Edge], graph: &RagGraph) -> Result<(), String> {
    let well_formed = edges.iter().filter(|e| e.endpoints().is_some()).count();
    if graph.edge_count() != well_formed {
        return Err(format!(
            "edge count mismatch: graph={}, well-formed={well_formed}",
            graph.edge_count()
        ));
    }
    if graph.edge_count() + graph.skipped_edges() != edges.len() {
        return Err("graph edges plus skipped edges do not cover the input".to_owned());
    }
    for (from, to) in edges.iter().filter_map(Edge::endpoints) {
        let a = graph
            .node_index(from)
            .ok_or_else(|| format!("node {from} not found in graph index"))?;
        let b = graph
            .node_index(to)
            .ok_or_else(|| format!("node {to} not found in graph index"))?;
        if graph.graph().find_edge(a, b).is_none() {
            return Err(format!("edge {from} -> {to} missing from graph"));
        }
    }
    for weight in graph.graph().edge_weights() {
        let source = edges
            .get(weight.data_index)
            .ok_or_else(|| format!("edge weight points past the input ({})", weight.data_index))?;
        if source.kind != weight.kind || source.id != weight.edge_id {
            return Err(format!(
                "edge weight at {} disagrees with its input edge",
                weight.data_index
            ));
        }
    }
    Ok(())
}

/// Verifies the shape of a detection result against the edges it came from:
/// - `deadlocked` matches the presence of cycles
/// - `cycles` and `cycles_edges` are parallel, without duplicates
/// - every cycle is closed, canonical and spans at least two processes
/// - every edge reference names an edge connecting its step
pub fn check_detection_result(result: &DetectionResult, edges: &[Edge]) -> Result<(), String> {
    if result.deadlocked == result.cycles.is_empty() {
        return Err("deadlocked flag disagrees with cycle list".to_owned());
    }
    if result.cycles.len() != result.cycles_edges.len() {
        return Err(format!(
            "cycles ({}) and cycles_edges ({}) differ in length",
            result.cycles.len(),
            result.cycles_edges.len()
        ));
    }
    let unique: HashSet<&CanonicalCycle> = result.cycles.iter().collect();
    if unique.len() != result.cycles.len() {
        return Err("duplicate cycle reported".to_owned());
    }

    let by_id: HashMap<&EdgeId, &Edge> = edges
        .iter()
        .filter_map(|e| e.id.as_ref().map(|id| (id, e)))
        .collect();

    for (cycle, refs) in result.cycles.iter().zip(&result.cycles_edges) {
        let nodes = cycle.nodes();
        if nodes.first() != nodes.last() || nodes.len() < 3 {
            return Err(format!("cycle {cycle} is not closed"));
        }
        if CanonicalCycle::from_core(cycle.core()) != *cycle {
            return Err(format!("cycle {cycle} is not in canonical rotation"));
        }
        if cycle.process_count() < 2 {
            return Err(format!("cycle {cycle} involves fewer than two processes"));
        }
        if refs.len() != cycle.core().len() {
            return Err(format!("cycle {cycle} has {} edge refs", refs.len()));
        }
        for ((from, to), edge_ref) in cycle.steps().zip(refs) {
            let backed = match edge_ref {
                EdgeRef::Id(id) => by_id
                    .get(id)
                    .is_some_and(|e| e.connects(from, to)),
                EdgeRef::Key { from: kf, to: kt } => {
                    kf == from
                        && kt == to
                        && edges.iter().any(|e| e.id.is_none() && e.connects(from, to))
                }
            };
            if !backed {
                return Err(format!("step {from} -> {to} has unbacked ref {edge_ref}"));
            }
        }
    }
    Ok(())
}

/// Cross-checks a detection result against petgraph's own algorithms:
/// a deadlocked graph is cyclic, and each cycle lies inside one strongly
/// connected component.
pub fn check_agrees_with_petgraph(result: &DetectionResult, graph: &RagGraph) -> Result<(), String> {
    if result.deadlocked && !is_cyclic_directed(graph.graph()) {
        return Err("deadlock reported on an acyclic graph".to_owned());
    }
    let mut component = HashMap::new();
    for (i, scc) in kosaraju_scc(graph.graph()).into_iter().enumerate() {
        for idx in scc {
            component.insert(idx, i);
        }
    }
    for cycle in &result.cycles {
        let comps: HashSet<Option<&usize>> = cycle
            .core()
            .iter()
            .map(|n| graph.node_index(n).and_then(|idx| component.get(&idx)))
            .collect();
        if comps.len() != 1 || comps.contains(&None) {
            return Err(format!("cycle {cycle} spans several components"));
        }
    }
    Ok(())
}

/// Verifies a full resolution run: the remaining graph is deadlock-free and
/// exactly the removed edges are gone, other edges keeping their order.
pub fn check_resolution(
    before: &[Edge],
    after: &[Edge],
    removed: &[Edge],
    remaining: &DetectionResult,
) -> Result<(), String> {
    if remaining.deadlocked {
        return Err(format!(
            "{} cycle(s) remain after resolution",
            remaining.cycles.len()
        ));
    }
    if after.len() + removed.len() != before.len() {
        return Err(format!(
            "edge accounting: before={}, after={}, removed={}",
            before.len(),
            after.len(),
            removed.len()
        ));
    }
    let mut rest = after.iter().peekable();
    let mut gone = Vec::new();
    for edge in before {
        if rest.peek() == Some(&edge) {
            rest.next();
        } else {
            gone.push(edge);
        }
    }
    if rest.next().is_some() {
        return Err("remaining edges are not a subsequence of the input".to_owned());
    }
    let mut expected: Vec<&Edge> = removed.iter().collect();
    let key = |e: &&Edge| format!("{e:?}");
    expected.sort_by_key(key);
    gone.sort_by_key(key);
    if expected != gone {
        return Err("removed edges differ from the edges actually missing".to_owned());
    }
    Ok(())
}
