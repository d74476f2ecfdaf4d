//! Implementation of `ragsim init`.
//!
//! Writes a new RAG document to stdout: an empty graph, or with `--example`
//! the classic two-process deadlock `P1 → R1 → P2 → R2 → P1`.
//!
//! Exit codes: 0 = always succeeds unless stdout write fails.
use ragsim_core::Rag;

use crate::error::CliError;
use crate::io::print_rag;

/// Runs the `init` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(example: bool) -> Result<(), CliError> {
    print_rag(&build(example))
}

/// The document `init` prints.
pub fn build(example: bool) -> Rag {
    if example { Rag::example() } else { Rag::new() }
}
