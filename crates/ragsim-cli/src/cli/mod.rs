//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ragsim_core::EdgeKind;

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
///
/// Parsing `"-"` yields [`PathOrStdin::Stdin`]; anything else yields
/// [`PathOrStdin::Path`].
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl PathOrStdin {
    /// Label used in error messages: the path, or `-` for stdin.
    pub fn label(&self) -> String {
        match self {
            PathOrStdin::Stdin => "-".to_owned(),
            PathOrStdin::Path(path) => path.display().to_string(),
        }
    }
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// Output format for CLI commands.
///
/// `Human` emits aligned text; `Json` emits a single JSON object on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    Human,
    /// Structured JSON output.
    Json,
}

/// Edge kind accepted by `connect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EdgeKindArg {
    /// The process waits for the resource (`process → resource`).
    Request,
    /// The resource is held by the process (`resource → process`).
    Allocation,
}

impl From<EdgeKindArg> for EdgeKind {
    fn from(kind: EdgeKindArg) -> Self {
        match kind {
            EdgeKindArg::Request => EdgeKind::Request,
            EdgeKindArg::Allocation => EdgeKind::Allocation,
        }
    }
}

/// All top-level subcommands exposed by the `ragsim` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Print a new resource allocation graph document.
    Init {
        /// Emit the two-process deadlock example instead of an empty graph.
        #[arg(long)]
        example: bool,
    },

    /// Print summary statistics for a graph.
    Inspect {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Detect deadlock cycles (exit 1 when deadlocked).
    Detect {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Break a deadlock by removing one edge of the first cycle.
    Resolve {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Keep removing edges until no deadlock remains.
        #[arg(long)]
        all: bool,
    },

    /// Append a process node.
    #[command(name = "add-process")]
    AddProcess {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Append a resource node.
    #[command(name = "add-resource")]
    AddResource {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Create a request or allocation edge between a process and a resource.
    Connect {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Process name (e.g. P1).
        #[arg(value_name = "PROCESS")]
        process: String,
        /// Resource name (e.g. R1).
        #[arg(value_name = "RESOURCE")]
        resource: String,
        /// Edge kind: request (default) or allocation.
        #[arg(long, default_value = "request", value_enum)]
        kind: EdgeKindArg,
    },

    /// Delete an edge by id.
    Disconnect {
        /// Path to a .rag.json file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Id of the edge to delete (e.g. e3).
        #[arg(value_name = "EDGE_ID")]
        edge_id: String,
    },
}

/// Root CLI struct for the `ragsim` binary.
///
/// All global flags are defined here and marked `global = true` so that clap
/// propagates them to every subcommand.
#[derive(Parser)]
#[command(
    name = "ragsim",
    version,
    about = "Resource allocation graph deadlock simulator",
    long_about = "Resource allocation graph deadlock simulator.\n\
                  Builds, inspects and edits single-instance RAG documents,\n\
                  detects deadlock cycles and breaks them by edge removal."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress all stderr output except errors (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging on stderr (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `RAGSIM_MAX_FILE_SIZE` environment variable.
    /// The CLI flag takes precedence over the environment variable.
    /// Default: 16777216 (16 MB).
    #[arg(
        long,
        global = true,
        env = "RAGSIM_MAX_FILE_SIZE",
        default_value = "16777216"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in human output.
    ///
    /// Also respects the `NO_COLOR` environment variable per
    /// <https://no-color.org>.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}
