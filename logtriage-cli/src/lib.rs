//! logtriage command-line front-end.
//!
//! Thin layer over `logtriage-correlator`: argument parsing, config loading,
//! and text/JSON rendering. All triage logic lives in the library crates.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

/// Dispatch a parsed command line to its handler.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = commands::resolve_config_path(cli.config.as_deref());
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, config_path.as_deref(), &writer).await,
        Commands::Correlate(args) => {
            commands::correlate::execute(args, config_path.as_deref(), &writer).await
        }
        Commands::Rules(args) => {
            commands::rules::execute(args, config_path.as_deref(), &writer).await
        }
        Commands::Config(args) => {
            commands::config::execute(args, config_path.as_deref(), &writer).await
        }
    }
}
