/// Report formatting: human-readable and JSON modes.
///
/// - **Human mode** (default): aligned text. The verdict line is colored
///   when colors are enabled. Colors are disabled when `--no-color` is set,
///   the `NO_COLOR` environment variable is present (per
///   <https://no-color.org>), or stdout is not a TTY.
/// - **JSON mode**: one JSON object per report.
use std::io::{IsTerminal as _, Write};

use ragsim_core::{DetectionResult, Edge};

use crate::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted.
///
/// Colors are disabled when any of the following conditions hold:
/// - `no_color_flag` is `true` (the `--no-color` CLI flag was passed).
/// - The `NO_COLOR` environment variable is present.
/// - stdout is not a TTY.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

// ---------------------------------------------------------------------------
// ANSI escape sequences
// ---------------------------------------------------------------------------

const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// FormatterConfig
// ---------------------------------------------------------------------------

/// Output settings derived from the global CLI flags.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Output mode.
    pub format: OutputFormat,
    /// Whether ANSI colors are enabled.
    pub colors: bool,
    /// Suppress all non-error stderr output.
    pub quiet: bool,
}

impl FormatterConfig {
    /// Constructs a [`FormatterConfig`] from the raw CLI flags.
    pub fn from_flags(format: OutputFormat, no_color_flag: bool, quiet: bool) -> Self {
        Self {
            format,
            colors: colors_enabled(no_color_flag),
            quiet,
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colors {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_owned()
        }
    }
}

// ---------------------------------------------------------------------------
// Detection report
// ---------------------------------------------------------------------------

/// Writes a detection report in the configured mode.
///
/// `has_allocations` qualifies the human "no deadlock" verdict: a graph
/// without allocation edges cannot deadlock, so the verdict says so instead.
///
/// # Errors
///
/// Returns an error only if writing to `w` fails.
pub fn write_detection<W: Write>(
    w: &mut W,
    result: &DetectionResult,
    has_allocations: bool,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    match config.format {
        OutputFormat::Human => write_detection_human(w, result, has_allocations, config),
        OutputFormat::Json => write_json(w, result),
    }
}

/// Human format:
///
/// ```text
/// deadlock: 1 cycle
/// Cycle 1: P1 → R1 → P2 → R2 → P1
///   edges: e1, e2, e3, e4
/// ```
fn write_detection_human<W: Write>(
    w: &mut W,
    result: &DetectionResult,
    has_allocations: bool,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !result.deadlocked {
        let verdict = if has_allocations {
            config.paint(ANSI_GREEN, "no deadlock")
        } else {
            config.paint(ANSI_YELLOW, "no deadlock (no allocations yet)")
        };
        return writeln!(w, "{verdict}");
    }

    let count = result.cycles.len();
    let verdict = config.paint(
        ANSI_RED,
        &format!("deadlock: {count} {}", pluralize(count, "cycle", "cycles")),
    );
    writeln!(w, "{verdict}")?;

    for (i, cycle) in result.cycles.iter().enumerate() {
        writeln!(w, "Cycle {}: {cycle}", i + 1)?;
        if let Some(refs) = result.cycles_edges.get(i) {
            let ids: Vec<String> = refs.iter().map(ToString::to_string).collect();
            writeln!(w, "  edges: {}", ids.join(", "))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Removed edges
// ---------------------------------------------------------------------------

/// Writes one line per edge removed by resolution, for stderr.
///
/// Nothing is written in quiet mode. JSON mode emits one object per line.
///
/// # Errors
///
/// Returns an error only if writing to `w` fails.
pub fn write_removed_edges<W: Write>(
    w: &mut W,
    removed: &[Edge],
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.format {
        OutputFormat::Human => {
            if removed.is_empty() {
                return writeln!(w, "nothing to resolve");
            }
            for edge in removed {
                writeln!(w, "removed {}", describe_edge(edge))?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            for edge in removed {
                let line = serde_json::to_string(edge).map_err(std::io::Error::other)?;
                writeln!(w, "{line}")?;
            }
            Ok(())
        }
    }
}

/// `e3 (request P2 -> R2)`, or `request P2 -> R2` for an edge without id.
pub fn describe_edge(edge: &Edge) -> String {
    let endpoint = |n: Option<&ragsim_core::NodeId>| n.map_or("?", |n| n.name()).to_owned();
    let body = format!(
        "{} {} -> {}",
        edge.kind,
        endpoint(edge.from.as_ref()),
        endpoint(edge.to.as_ref())
    );
    match &edge.id {
        Some(id) => format!("{id} ({body})"),
        None => body,
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Writes `value` as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<W: Write, T: serde::Serialize + ?Sized>(
    w: &mut W,
    value: &T,
) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(w, "{json}")
}

fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
