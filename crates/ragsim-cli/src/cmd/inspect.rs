//! Implementation of `ragsim inspect <file>`.
//!
//! Prints summary statistics for a RAG document to stdout:
//! - process and resource names
//! - edge count by kind
//! - the next edge id the graph will assign
//! - whether the graph is currently deadlocked
//!
//! In `--format json` mode a single JSON object is emitted to stdout.
//! In human mode, aligned key/value lines are printed.
//!
//! Exit codes: 0 = success, 2 = read or parse failure.
use ragsim_core::{EdgeId, Rag};

use crate::OutputFormat;
use crate::error::CliError;

/// Statistics gathered from a [`Rag`].
pub struct InspectStats {
    /// Process names in declaration order.
    pub processes: Vec<String>,
    /// Resource names in declaration order.
    pub resources: Vec<String>,
    /// Total number of edges.
    pub edge_count: usize,
    /// Number of request edges.
    pub request_edges: usize,
    /// Number of allocation edges.
    pub allocation_edges: usize,
    /// Edges lacking an endpoint; detection ignores them.
    pub malformed_edges: usize,
    /// Id the next created edge will receive.
    pub next_edge_id: String,
    /// Number of deadlock cycles.
    pub cycle_count: usize,
}

impl InspectStats {
    /// Computes statistics from a [`Rag`].
    pub fn from_rag(rag: &Rag) -> Self {
        let (request_edges, allocation_edges) = rag.edge_counts();
        let names = |nodes: &[ragsim_core::NodeId]| -> Vec<String> {
            nodes.iter().map(ToString::to_string).collect()
        };
        Self {
            processes: names(rag.processes()),
            resources: names(rag.resources()),
            edge_count: rag.edges().len(),
            request_edges,
            allocation_edges,
            malformed_edges: rag.edges().iter().filter(|e| e.endpoints().is_none()).count(),
            next_edge_id: EdgeId::sequential(rag.next_edge_seq()).to_string(),
            cycle_count: rag.detect().cycles.len(),
        }
    }
}

/// Runs the `inspect` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(rag: &Rag, format: OutputFormat) -> Result<(), CliError> {
    let stats = InspectStats::from_rag(rag);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Human => print_human(&mut out, &stats),
        OutputFormat::Json => print_json(&mut out, &stats),
    }
    .map_err(|e| CliError::write_failed("stdout", &e))
}

/// Writes inspect statistics in human-readable aligned format.
fn print_human<W: std::io::Write>(w: &mut W, stats: &InspectStats) -> std::io::Result<()> {
    writeln!(
        w,
        "processes:   {} [{}]",
        stats.processes.len(),
        stats.processes.join(", ")
    )?;
    writeln!(
        w,
        "resources:   {} [{}]",
        stats.resources.len(),
        stats.resources.join(", ")
    )?;
    writeln!(w, "edges:       {}", stats.edge_count)?;
    writeln!(w, "  request: {}", stats.request_edges)?;
    writeln!(w, "  allocation: {}", stats.allocation_edges)?;
    if stats.malformed_edges > 0 {
        writeln!(w, "  malformed: {}", stats.malformed_edges)?;
    }
    writeln!(w, "next edge:   {}", stats.next_edge_id)?;
    writeln!(w, "cycles:      {}", stats.cycle_count)
}

/// Writes inspect statistics as a single JSON object.
fn print_json<W: std::io::Write>(w: &mut W, stats: &InspectStats) -> std::io::Result<()> {
    let value = serde_json::json!({
        "processes": stats.processes,
        "resources": stats.resources,
        "edge_count": stats.edge_count,
        "edge_counts": {
            "request": stats.request_edges,
            "allocation": stats.allocation_edges,
        },
        "malformed_edges": stats.malformed_edges,
        "next_edge_id": stats.next_edge_id,
        "deadlocked": stats.cycle_count > 0,
        "cycle_count": stats.cycle_count,
    });
    crate::format::write_json(w, &value)
}
