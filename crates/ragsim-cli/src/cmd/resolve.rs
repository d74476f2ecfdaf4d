//! Implementation of `ragsim resolve <file>`.
//!
//! Removes one edge of the first deadlock cycle (or, with `--all`, keeps
//! removing until the graph is deadlock-free) and prints the updated
//! document to stdout. Removed edges are reported on stderr.
//!
//! A graph without deadlock is printed unchanged.
//!
//! Exit codes: 0 = success, 2 = read or parse failure.
use ragsim_core::Rag;

use crate::error::CliError;
use crate::format::{FormatterConfig, write_removed_edges};
use crate::io::print_rag;

/// Runs the `resolve` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout or stderr cannot be written.
pub fn run(mut rag: Rag, all: bool, config: &FormatterConfig) -> Result<(), CliError> {
    let removed = if all {
        rag.resolve_all()
    } else {
        rag.resolve_deadlock().into_iter().collect()
    };

    let remaining = rag.detect().cycles.len();
    if remaining > 0 {
        tracing::info!(remaining, "deadlock cycles remain after resolution");
    }

    print_rag(&rag)?;

    let stderr = std::io::stderr();
    let mut err = stderr.lock();
    write_removed_edges(&mut err, &removed, config)
        .map_err(|e| CliError::write_failed("stderr", &e))
}
