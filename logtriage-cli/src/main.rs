use clap::Parser;

use logtriage_cli::cli::Cli;
use logtriage_cli::{commands, logging};
use logtriage_core::config::GeneralConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging follows the config file when it loads; errors surface later from the command.
    let config_path = commands::resolve_config_path(cli.config.as_deref());
    let general = commands::load_config(config_path.as_deref())
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    let log_level = cli.log_level.clone().unwrap_or(general.log_level);
    match logging::init_tracing_with_fallback(
        &log_level,
        &general.log_format,
        &GeneralConfig::default(),
    ) {
        Ok(None) => {}
        Ok(Some(e)) => eprintln!("warning: {e}; using default logging"),
        Err(e) => eprintln!("warning: {e}; continuing without logging"),
    }

    logtriage_core::metrics::describe_all();
    tracing::debug!(command = ?cli.command, "logtriage starting");

    if let Err(e) = logtriage_cli::run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
