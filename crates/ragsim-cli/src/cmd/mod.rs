/// Command module for the `ragsim` CLI.
///
/// Each submodule implements one subcommand (or a family of graph edits).
/// Every `run` function takes the parsed arguments and returns `Ok(())` on
/// success or a [`crate::error::CliError`] on failure. Commands that change
/// the graph print the updated document to stdout and report what changed
/// on stderr.
pub mod detect;
pub mod edit;
pub mod init;
pub mod inspect;
pub mod resolve;

use crate::error::CliError;

/// Writes a one-line status note to stderr unless `quiet` is set.
pub(crate) fn note(quiet: bool, line: &str) -> Result<(), CliError> {
    use std::io::Write as _;

    if quiet {
        return Ok(());
    }
    let stderr = std::io::stderr();
    let mut err = stderr.lock();
    writeln!(err, "{line}").map_err(|e| CliError::write_failed("stderr", &e))
}
