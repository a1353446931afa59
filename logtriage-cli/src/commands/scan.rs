//! `logtriage scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logtriage_core::config::TriageConfig;
use logtriage_core::types::ErrorRecord;
use logtriage_correlator::{EngineConfig, ErrorScanner};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let report = scan_file(&args.log, args.custom_rules.as_deref(), &config).await?;
    writer.render(&report)
}

/// Scan one log file with the given configuration.
pub async fn scan_file(
    log: &Path,
    custom_rules: Option<&Path>,
    config: &TriageConfig,
) -> Result<ScanReport, CliError> {
    let engine_config = EngineConfig::from_core(config)?;
    let classifier = super::build_classifier(custom_rules, config).await?;
    let scanner = ErrorScanner::with_classifier(engine_config.scan, classifier)?;

    let text = super::read_log(log).await?;
    info!(path = %log.display(), bytes = text.len(), "scanning log file");

    let errors = scanner.scan(&text);
    Ok(ScanReport {
        source: log.display().to_string(),
        lines: text.lines().count(),
        error_count: errors.len(),
        errors,
    })
}

/// Errors detected in one log file.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub lines: usize,
    pub error_count: usize,
    pub errors: Vec<ErrorRecord>,
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {}", self.source.bold())?;
        writeln!(
            w,
            "  Lines: {}, errors: {}",
            self.lines,
            if self.error_count > 0 {
                self.error_count.to_string().red()
            } else {
                self.error_count.to_string().green()
            }
        )?;

        if self.errors.is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        writeln!(
            w,
            "{:<7} {:<22} {:<16} {:<24} Message",
            "Line", "Category", "Timestamp", "Request IDs"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;

        for e in &self.errors {
            writeln!(
                w,
                "{:<7} {:<22} {:<16} {:<24} {}",
                e.line_number,
                e.category.as_str().yellow(),
                e.timestamp.as_deref().unwrap_or("-"),
                truncate(&e.request_ids.join(","), 24),
                truncate(e.message(), 80)
            )?;
        }

        Ok(())
    }
}
