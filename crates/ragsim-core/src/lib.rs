#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod enums;
pub mod graph;
pub mod newtypes;
pub mod resolution;
pub mod simulator;
pub mod structures;

#[cfg(test)]
mod test_helpers;

pub use enums::{EdgeKind, NodeKind};
pub use graph::{
    CanonicalCycle, DetectionResult, EdgeWeight, NodeWeight, RagGraph, build_graph, detect,
};
pub use newtypes::{EdgeId, NewtypeError, NodeId};
pub use resolution::{EdgeChoice, choose_edge, choose_edge_by_nodes};
pub use simulator::{Rag, RagError};
pub use structures::{Edge, EdgeRef};

/// Returns the current version of the ragsim-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
