/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `ragsim` binary. Every
/// variant maps to a stable exit code (1 or 2) via [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. The tool could not read or parse the
///   input, or an argument is malformed. Nothing has been written to stdout.
/// - Exit code **1**: logical outcome. The tool ran to completion but the
///   result is a well-defined failure (deadlock present, mutation rejected).
use std::path::PathBuf;

use ragsim_core::RagError;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions that the `ragsim` CLI can produce.
///
/// Use [`CliError::exit_code`] to obtain the exit code associated with each
/// variant. [`CliError::message`] returns the line printed to stderr before
/// exiting.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    #[error("file not found: {}", .path.display())]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    #[error("permission denied: {}", .path.display())]
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    #[error("file too large: {}", too_large_detail(.label, .limit, .actual))]
    FileTooLarge {
        /// `"-"` for stdin, or the filesystem path.
        label: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes, if known (disk files only).
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    #[error("invalid UTF-8 in {label}: first invalid byte at offset {byte_offset}")]
    InvalidUtf8 {
        /// `"-"` for stdin, or the filesystem path.
        label: String,
        /// The byte offset of the first invalid byte sequence.
        byte_offset: usize,
    },

    /// An I/O error occurred while reading from stdin.
    #[error("failed to read stdin: {detail}")]
    StdinReadError {
        /// The underlying I/O error message.
        detail: String,
    },

    /// A generic I/O error not covered by the more specific variants above.
    #[error("I/O error on {label}: {detail}")]
    IoError {
        /// The file, stream or operation involved.
        label: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// The input is not a valid RAG document.
    #[error("cannot parse {label}: {detail}")]
    ParseFailed {
        /// `"-"` for stdin, or the filesystem path.
        label: String,
        /// Parser message including line and column.
        detail: String,
    },

    /// A command-line argument could not be interpreted.
    #[error("invalid argument: {detail}")]
    InvalidArgument {
        /// What was wrong with the argument.
        detail: String,
    },

    // --- Exit code 1: logical outcomes ---
    /// `detect` found at least one deadlock cycle.
    ///
    /// The report has already been printed; this variant exists so `main`
    /// can exit with status 1 cleanly.
    #[error("deadlock detected: {cycles} cycle(s)")]
    DeadlockDetected {
        /// Number of distinct cycles reported.
        cycles: usize,
    },

    /// The graph refused the requested mutation.
    #[error("rejected: {0}")]
    Rejected(#[from] RagError),
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2`: input failure (file not found, parse error, bad argument).
    /// - `1`: logical outcome (deadlock detected, mutation rejected).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::ParseFailed { .. }
            | Self::InvalidArgument { .. } => 2,

            Self::DeadlockDetected { .. } | Self::Rejected(_) => 1,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        format!("error: {self}")
    }

    /// Wraps a failed write to stdout or stderr.
    pub fn write_failed(stream: &str, e: &std::io::Error) -> Self {
        Self::IoError {
            label: stream.to_owned(),
            detail: e.to_string(),
        }
    }
}

fn too_large_detail(label: &str, limit: &u64, actual: &Option<u64>) -> String {
    match actual {
        Some(actual) => format!("{label} is {actual} bytes, limit is {limit} bytes"),
        None => format!("{label} exceeded limit of {limit} bytes"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
