//! Shared test helper functions for constructing test fixtures.
//!
//! This module is compiled only in test builds. Integration tests in
//! `crates/ragsim-core/tests/` define their own local helpers because they
//! link against the non-test library build where this module is not
//! available.
#![allow(clippy::expect_used)]

use petgraph::stable_graph::NodeIndex;

use crate::graph::RagGraph;
use crate::newtypes::{EdgeId, NodeId};
use crate::structures::Edge;

/// Parses a node name using the process prefix convention.
pub fn node(s: &str) -> NodeId {
    NodeId::try_from(s).expect("valid NodeId")
}

/// The `n`th process.
pub fn p(n: usize) -> NodeId {
    NodeId::process(n)
}

/// The `n`th resource.
pub fn r(n: usize) -> NodeId {
    NodeId::resource(n)
}

/// Creates an [`EdgeId`] from a string slice, panicking on invalid input.
pub fn eid(s: &str) -> EdgeId {
    EdgeId::try_from(s).expect("valid EdgeId")
}

/// A request edge `from → to` with id `id`.
pub fn req(id: &str, from: &str, to: &str) -> Edge {
    Edge::request(Some(eid(id)), node(from), node(to))
}

/// An allocation edge `from → to` with id `id`.
pub fn alloc(id: &str, from: &str, to: &str) -> Edge {
    Edge::allocation(Some(eid(id)), node(from), node(to))
}

/// A request edge without an id.
pub fn anon_req(from: &str, to: &str) -> Edge {
    Edge::request(None, node(from), node(to))
}

/// An allocation edge without an id.
pub fn anon_alloc(from: &str, to: &str) -> Edge {
    Edge::allocation(None, node(from), node(to))
}

/// Parses a list of node names.
pub fn nodes(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| node(n)).collect()
}

/// Resolves a node name to its [`NodeIndex`] in `graph`.
pub fn idx(graph: &RagGraph, name: &str) -> NodeIndex {
    graph.node_index(&node(name)).expect("node must exist")
}

/// The classic two-process deadlock: `P1 → R1 → P2 → R2 → P1`.
pub fn minimal_deadlock() -> Vec<Edge> {
    vec![
        req("e1", "P1", "R1"),
        alloc("e2", "R1", "P2"),
        req("e3", "P2", "R2"),
        alloc("e4", "R2", "P1"),
    ]
}
