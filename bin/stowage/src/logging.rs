//! Logging setup for the command-line client.

use clap::Args;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub(crate) struct LogArgs {
    /// Silence all output but errors.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "stowage_chain=debug").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub(crate) json: bool,
}

/// Build the filter.
///
/// `--quiet` shows errors only. Otherwise `RUST_LOG` if set, else a level
/// from `-v`, then any `--log.filter` directives on top.
pub(crate) fn filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }
    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));
    if let Some(custom) = &args.filter {
        for directive in custom.split(',') {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    filter
}

/// Install the global subscriber. Logs go to stderr; stdout carries results.
pub(crate) fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(args)).with_writer(std::io::stderr);
    let installed = if args.json { builder.json().try_init() } else { builder.without_time().try_init() };
    installed.map_err(|e| eyre::eyre!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins() {
        let args = LogArgs { quiet: true, verbosity: 3, ..Default::default() };
        assert_eq!(filter(&args).to_string(), "error");
    }
}
