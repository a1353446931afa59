//! Command handlers -- one module per subcommand, plus shared loading helpers

pub mod config;
pub mod correlate;
pub mod rules;
pub mod scan;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use logtriage_core::config::TriageConfig;
use logtriage_correlator::{PatternClassifier, RuleLoader};

use crate::cli::DEFAULT_CONFIG_FILE;
use crate::error::CliError;

/// Resolve which configuration file to read.
///
/// An explicit path always wins. Without one, `./logtriage.toml` is used when
/// it exists; `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

/// Human-readable label for where the configuration came from.
pub fn config_source_label(path: Option<&Path>) -> String {
    path.map_or_else(|| "(built-in defaults)".to_owned(), |p| p.display().to_string())
}

/// Load the effective configuration: file (if any), env overrides, validation.
pub async fn load_config(path: Option<&Path>) -> Result<TriageConfig, CliError> {
    match path {
        Some(path) => Ok(TriageConfig::load(path).await?),
        None => {
            let mut config = TriageConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Read a log file, replacing invalid UTF-8 sequences.
pub async fn read_log(path: &Path) -> Result<String, CliError> {
    let bytes = tokio::fs::read(path).await?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), "log is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(text)
}

/// Build the classifier: built-in rules plus an optional custom rule file.
///
/// The command-line path takes precedence over `scanner.custom_rules_path`.
pub async fn build_classifier(
    cli_rules: Option<&Path>,
    config: &TriageConfig,
) -> Result<PatternClassifier, CliError> {
    let mut classifier = PatternClassifier::new();
    let path = cli_rules
        .map(Path::to_path_buf)
        .or_else(|| config.scanner.custom_rules_path.as_ref().map(PathBuf::from));

    if let Some(path) = path {
        let added = RuleLoader::load_into(&mut classifier, &path).await?;
        info!(path = %path.display(), added, "custom rules loaded");
    }
    Ok(classifier)
}
