//! Implementation of `ragsim detect <file>`.
//!
//! Runs deadlock detection and prints the verdict to stdout. Human mode
//! lists each cycle with the ids of its edges; JSON mode prints the
//! detection result object (`deadlocked`, `cycles`, `cycles_edges`).
//!
//! Exit codes:
//! - 0 = no deadlock
//! - 1 = at least one deadlock cycle
//! - 2 = read or parse failure
use ragsim_core::Rag;

use crate::error::CliError;
use crate::format::{FormatterConfig, write_detection};

/// Runs the `detect` command.
///
/// # Errors
///
/// - [`CliError::DeadlockDetected`] when the graph is deadlocked.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(rag: &Rag, config: &FormatterConfig) -> Result<(), CliError> {
    let result = rag.detect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_detection(&mut out, &result, rag.has_allocations(), config)
        .map_err(|e| CliError::write_failed("stdout", &e))?;

    if result.deadlocked {
        Err(CliError::DeadlockDetected {
            cycles: result.cycles.len(),
        })
    } else {
        Ok(())
    }
}
