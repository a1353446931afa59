//! Logging initialization for the logtriage binary.
//!
//! Configures `tracing-subscriber` from the `[general]` section of the
//! configuration. Logs go to stderr so stdout stays clean for reports and CSV.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logtriage_core::config::GeneralConfig;

use crate::error::CliError;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable multi-line output
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), CliError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize JSON tracing subscriber: {e}"))
            }),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize pretty tracing subscriber: {e}"))
            }),
        other => Err(CliError::Config(format!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        ))),
    }
}

/// Initialize tracing, retrying with `fallback` when the requested settings fail.
///
/// Returns the first failure when the fallback took over, or an error carrying
/// both messages when neither could be installed.
pub fn init_tracing_with_fallback(
    log_level: &str,
    log_format: &str,
    fallback: &GeneralConfig,
) -> Result<Option<CliError>, CliError> {
    let first = match init_tracing(log_level, log_format) {
        Ok(()) => return Ok(None),
        Err(e) => e,
    };
    match init_tracing(&fallback.log_level, &fallback.log_format) {
        Ok(()) => Ok(Some(first)),
        Err(second) => Err(CliError::Config(format!(
            "{first}; fallback logging also failed: {second}"
        ))),
    }
}
