/// Structured logging setup for the `ragsim` binary.
///
/// Installs a `tracing-subscriber` fmt layer on stderr. The level comes from
/// the global flags (`warn` by default, `debug` with `--verbose`, `error`
/// with `--quiet`); a directive in the `RAGSIM_LOG` environment variable
/// replaces it entirely.
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "RAGSIM_LOG";

/// Logging settings derived from the global CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub quiet: bool,
    pub verbose: bool,
    /// Emit ANSI colors in log lines.
    pub ansi: bool,
}

impl LogConfig {
    /// The filter directive used when `RAGSIM_LOG` is unset.
    pub fn default_directive(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns the subscriber error message if a global subscriber is already
/// installed.
pub fn init(config: LogConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(quiet: bool, verbose: bool) -> LogConfig {
        LogConfig {
            quiet,
            verbose,
            ansi: false,
        }
    }

    #[test]
    fn default_level_is_warn() {
        assert_eq!(config(false, false).default_directive(), "warn");
    }

    #[test]
    fn verbose_enables_debug() {
        assert_eq!(config(false, true).default_directive(), "debug");
    }

    #[test]
    fn quiet_keeps_errors_only() {
        assert_eq!(config(true, false).default_directive(), "error");
    }

    #[test]
    fn second_init_reports_error() {
        // Whichever call installs first, the other must fail.
        let first = init(config(false, false));
        let second = init(config(false, false));
        assert!(first.is_err() || second.is_err());
    }
}
