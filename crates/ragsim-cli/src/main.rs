//! `ragsim`: resource allocation graph deadlock simulator.
use clap::Parser;

mod cli;
mod cmd;
mod error;
mod format;
mod io;
mod logging;

pub use cli::{Cli, Command, EdgeKindArg, OutputFormat, PathOrStdin};

use error::CliError;
use format::FormatterConfig;
use logging::LogConfig;

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig {
        quiet: cli.quiet,
        verbose: cli.verbose,
        ansi: format::colors_enabled(cli.no_color),
    };
    if let Err(e) = logging::init(log_config) {
        eprintln!("warning: logging disabled: {e}");
    }

    let exit_code = match dispatch(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e.message());
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

/// Loads the input (if any) and runs the selected subcommand.
fn dispatch(cli: &Cli) -> Result<(), CliError> {
    let config = FormatterConfig::from_flags(cli.format, cli.no_color, cli.quiet);
    let load = |file: &PathOrStdin| io::load_rag(file, cli.max_file_size);

    match &cli.command {
        Command::Init { example } => cmd::init::run(*example),
        Command::Inspect { file } => cmd::inspect::run(&load(file)?, cli.format),
        Command::Detect { file } => cmd::detect::run(&load(file)?, &config),
        Command::Resolve { file, all } => cmd::resolve::run(load(file)?, *all, &config),
        Command::AddProcess { file } => cmd::edit::add_process(load(file)?, cli.quiet),
        Command::AddResource { file } => cmd::edit::add_resource(load(file)?, cli.quiet),
        Command::Connect {
            file,
            process,
            resource,
            kind,
        } => cmd::edit::connect(
            load(file)?,
            process,
            resource,
            (*kind).into(),
            cli.quiet,
        ),
        Command::Disconnect { file, edge_id } => {
            cmd::edit::disconnect(load(file)?, edge_id, cli.quiet)
        }
    }
}
