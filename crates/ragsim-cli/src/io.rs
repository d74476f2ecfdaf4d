/// File and stdin reading with size enforcement, plus RAG document I/O.
///
/// This module is the single entry point for all input I/O in the `ragsim`
/// binary. `ragsim-core` never touches the filesystem; all reading happens here.
///
/// Key behaviours:
/// - Disk files: size checked via `std::fs::metadata` before any read.
/// - Stdin: buffered with a `Read::take` cap so allocation is bounded.
/// - UTF-8 validation via `std::str::from_utf8` with byte-offset reporting.
/// - All input errors are converted to [`CliError`] variants with exit code 2.
use std::io::{ErrorKind, Read as _, Write};
use std::path::Path;

use ragsim_core::Rag;

use crate::PathOrStdin;
use crate::error::CliError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads the entire contents of `source` into a `String`.
///
/// # Errors
///
/// Returns [`CliError`] (exit code 2) for a missing or unreadable file,
/// input over `max_size`, any other I/O error, and invalid UTF-8.
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    match source {
        PathOrStdin::Path(path) => read_file(path, max_size),
        PathOrStdin::Stdin => read_stdin(max_size),
    }
}

/// Reads and parses a RAG document from `source`.
///
/// # Errors
///
/// Everything [`read_input`] returns, plus [`CliError::ParseFailed`] when the
/// content is not a RAG document.
pub fn load_rag(source: &PathOrStdin, max_size: u64) -> Result<Rag, CliError> {
    let content = read_input(source, max_size)?;
    let rag = parse_rag(&content, &source.label())?;
    tracing::debug!(
        source = %source.label(),
        processes = rag.processes().len(),
        resources = rag.resources().len(),
        edges = rag.edges().len(),
        "loaded graph"
    );
    Ok(rag)
}

/// Parses `content` as a RAG document; `label` names the source in errors.
///
/// # Errors
///
/// [`CliError::ParseFailed`] with the line and column of the first problem.
pub fn parse_rag(content: &str, label: &str) -> Result<Rag, CliError> {
    serde_json::from_str(content).map_err(|e| CliError::ParseFailed {
        label: label.to_owned(),
        detail: format!("line {}, column {}: {e}", e.line(), e.column()),
    })
}

/// Writes `rag` to `w` as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// [`CliError::IoError`] if serialization or the write fails.
pub fn write_rag<W: Write>(w: &mut W, rag: &Rag) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(rag).map_err(|e| CliError::IoError {
        label: "stdout".to_owned(),
        detail: format!("JSON serialization failed: {e}"),
    })?;
    writeln!(w, "{json}").map_err(|e| CliError::write_failed("stdout", &e))
}

/// Writes `rag` to stdout.
///
/// # Errors
///
/// See [`write_rag`].
pub fn print_rag(rag: &Rag) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_rag(&mut out, rag)
}

// ---------------------------------------------------------------------------
// Disk file reading
// ---------------------------------------------------------------------------

/// Reads a disk file, enforcing the size limit and UTF-8 requirement.
fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            label: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(bytes, &path.display().to_string())
}

/// Maps a `std::io::Error` arising from a disk-file operation to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            label: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stdin reading
// ---------------------------------------------------------------------------

/// Reads the entire stdin stream, capped at `max_size` bytes.
///
/// If the stream produces exactly `max_size` bytes one more byte is probed
/// to distinguish "at the limit" from "over the limit".
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let stdin = std::io::stdin();
    let mut handle = stdin.lock();
    let buf = read_capped(&mut handle, max_size, "-")?;
    bytes_to_string(buf, "-")
}

/// Reads `reader` to the end, failing once more than `max_size` bytes arrive.
fn read_capped<R: std::io::Read>(
    reader: &mut R,
    max_size: u64,
    label: &str,
) -> Result<Vec<u8>, CliError> {
    let read_err = |e: std::io::Error| CliError::StdinReadError {
        detail: e.to_string(),
    };

    let mut buf: Vec<u8> = Vec::new();
    reader
        .by_ref()
        .take(max_size)
        .read_to_end(&mut buf)
        .map_err(read_err)?;

    if buf.len() as u64 == max_size {
        let mut probe = [0u8; 1];
        if reader.read(&mut probe).map_err(read_err)? > 0 {
            return Err(CliError::FileTooLarge {
                label: label.to_owned(),
                limit: max_size,
                actual: None,
            });
        }
    }

    Ok(buf)
}

// ---------------------------------------------------------------------------
// UTF-8 conversion
// ---------------------------------------------------------------------------

/// Converts a byte buffer to a `String`, returning a [`CliError`] with the
/// byte offset of the first invalid sequence on failure.
fn bytes_to_string(bytes: Vec<u8>, label: &str) -> Result<String, CliError> {
    String::from_utf8(bytes).map_err(|e| CliError::InvalidUtf8 {
        label: label.to_owned(),
        byte_offset: e.utf8_error().valid_up_to(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
