//! `logtriage config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logtriage_core::config::TriageConfig;
use logtriage_correlator::EngineConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
pub const SECTIONS: [&str; 4] = ["general", "scanner", "correlation", "lookup"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => {
            let report = validate(config_path).await;
            writer.render(&report)?;
            if !report.valid {
                return Err(CliError::Config("configuration is invalid".to_owned()));
            }
            Ok(())
        }
        ConfigAction::Show { section } => {
            let config = super::load_config(config_path).await?;
            let report = show(&config, config_path, section.as_deref())?;
            writer.render(&report)
        }
    }
}

/// Load the configuration and check that the engine accepts it.
///
/// Besides TOML and range checks this parses the offset, reference date and
/// dedup scope strings. A missing client offset is only a warning since
/// `scan` works without it.
pub async fn validate(config_path: Option<&Path>) -> ConfigValidationReport {
    let source = super::config_source_label(config_path);
    info!(source = %source, "validating configuration");

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    match super::load_config(config_path).await {
        Ok(config) => {
            if let Err(e) = EngineConfig::from_core(&config) {
                errors.push(e.to_string());
            }
            if config.correlation.client_utc_offset.is_none() {
                warnings.push(
                    "correlation.client_utc_offset is not set; `correlate` will need --client-offset"
                        .to_owned(),
                );
            }
        }
        Err(e) => errors.push(e.to_string()),
    }

    ConfigValidationReport {
        source,
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Render the effective configuration, optionally a single section.
pub fn show(
    config: &TriageConfig,
    config_path: Option<&Path>,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("scanner") => toml::to_string_pretty(&config.scanner),
        Some("correlation") => toml::to_string_pretty(&config.correlation),
        Some("lookup") => toml::to_string_pretty(&config.lookup),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: {})",
                SECTIONS.join(", ")
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {e})"));

    Ok(ConfigReport {
        source: super::config_source_label(config_path),
        section: section.map(str::to_owned),
        config_toml,
    })
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        for warning in &self.warnings {
            writeln!(w, "  Warning: {}", warning.yellow())?;
        }
        Ok(())
    }
}
