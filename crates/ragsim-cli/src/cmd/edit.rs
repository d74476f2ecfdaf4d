//! Implementations of the graph-editing commands:
//! `add-process`, `add-resource`, `connect` and `disconnect`.
//!
//! Each command loads a document, applies one mutation and prints the
//! updated document to stdout. A short note about the change goes to
//! stderr unless `--quiet` is set.
//!
//! Exit codes:
//! - 0 = success
//! - 1 = mutation rejected (unknown node or edge, duplicate edge)
//! - 2 = read or parse failure, or a malformed name argument
use ragsim_core::{EdgeId, EdgeKind, NodeId, NodeKind, Rag};

use super::note;
use crate::error::CliError;
use crate::format::describe_edge;
use crate::io::print_rag;

/// Runs `add-process`.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if output cannot be written.
pub fn add_process(mut rag: Rag, quiet: bool) -> Result<(), CliError> {
    let node = rag.add_process();
    print_rag(&rag)?;
    note(quiet, &format!("added process {node}"))
}

/// Runs `add-resource`.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if output cannot be written.
pub fn add_resource(mut rag: Rag, quiet: bool) -> Result<(), CliError> {
    let node = rag.add_resource();
    print_rag(&rag)?;
    note(quiet, &format!("added resource {node}"))
}

/// Runs `connect`.
///
/// # Errors
///
/// - [`CliError::InvalidArgument`] for a malformed node name.
/// - [`CliError::Rejected`] for an undeclared node or a duplicate edge.
pub fn connect(
    mut rag: Rag,
    process: &str,
    resource: &str,
    kind: EdgeKind,
    quiet: bool,
) -> Result<(), CliError> {
    let process = node_arg(NodeKind::Process, process)?;
    let resource = node_arg(NodeKind::Resource, resource)?;
    let edge = rag.create_edge(&process, &resource, kind)?;
    print_rag(&rag)?;
    note(quiet, &format!("created {}", describe_edge(&edge)))
}

/// Runs `disconnect`.
///
/// # Errors
///
/// - [`CliError::InvalidArgument`] for a malformed edge id.
/// - [`CliError::Rejected`] if no edge has that id.
pub fn disconnect(mut rag: Rag, edge_id: &str, quiet: bool) -> Result<(), CliError> {
    let id = EdgeId::try_from(edge_id).map_err(|e| CliError::InvalidArgument {
        detail: e.to_string(),
    })?;
    let edge = rag.delete_edge(&id)?;
    print_rag(&rag)?;
    note(quiet, &format!("deleted {}", describe_edge(&edge)))
}

/// Parses a node-name argument with the kind its position implies.
fn node_arg(kind: NodeKind, name: &str) -> Result<NodeId, CliError> {
    NodeId::new(kind, name).map_err(|e| CliError::InvalidArgument {
        detail: e.to_string(),
    })
}
