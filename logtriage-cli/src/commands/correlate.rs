//! `logtriage correlate` command handler

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use logtriage_core::config::TriageConfig;
use logtriage_core::types::CorrelationRow;
use logtriage_correlator::{
    EngineConfig, StaticBackendSource, TriageEngineBuilder, TriageReport, TriageSummary,
    write_csv,
};

use crate::cli::{CorrelateArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `correlate` command.
///
/// Ctrl-C cancels outstanding backend lookups; the table is still produced
/// from whatever finished.
pub async fn execute(
    args: CorrelateArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling outstanding backend lookups");
                cancel.cancel();
            }
        }
    });

    let result = run_correlation(&args, config, cancel).await;
    interrupt.abort();
    let report = result?;

    if let Some(csv_path) = &args.csv {
        write_csv_file(csv_path, &report.rows)?;
        info!(path = %csv_path.display(), rows = report.rows.len(), "correlation table written");
    }

    let summary = CorrelateReport::new(&args, report);
    match (writer.format(), &args.csv) {
        // CSV owns stdout, so the summary moves to stderr.
        (OutputFormat::Text, None) => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_csv(&summary.rows, &mut handle)?;
            handle.flush()?;
            writer.render_to(&summary, &mut std::io::stderr())
        }
        _ => writer.render(&summary),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut TriageConfig, args: &CorrelateArgs) {
    if let Some(offset) = &args.client_offset {
        config.correlation.client_utc_offset = Some(offset.clone());
    }
    if let Some(date) = &args.reference_date {
        config.correlation.reference_date = Some(date.clone());
    }
    if let Some(dedup) = args.dedup {
        config.correlation.dedup_scope = dedup.as_config_value().to_owned();
    }
}

/// Scan, look up backend entries and build the correlation table.
pub async fn run_correlation(
    args: &CorrelateArgs,
    mut config: TriageConfig,
    cancel: CancellationToken,
) -> Result<TriageReport, CliError> {
    apply_overrides(&mut config, args);
    let engine_config = EngineConfig::from_core(&config)?;
    let classifier = super::build_classifier(args.custom_rules.as_deref(), &config).await?;
    let source = StaticBackendSource::load_file(&args.backend).await?;

    let engine = TriageEngineBuilder::new()
        .config(engine_config)
        .classifier(classifier)
        .source(source)
        .build()?;

    let text = super::read_log(&args.log).await?;
    info!(path = %args.log.display(), bytes = text.len(), "correlating log file");
    Ok(engine.run(&text, cancel).await)
}

fn write_csv_file(path: &Path, rows: &[CorrelationRow]) -> Result<(), CliError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_csv(rows, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Summary of one correlation run; JSON output also carries the full table.
#[derive(Serialize)]
pub struct CorrelateReport {
    pub report_id: String,
    pub log: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    pub summary: TriageSummary,
    pub rows: Vec<CorrelationRow>,
}

impl CorrelateReport {
    fn new(args: &CorrelateArgs, report: TriageReport) -> Self {
        Self {
            report_id: report.report_id,
            log: args.log.display().to_string(),
            backend: args.backend.display().to_string(),
            csv: args.csv.as_ref().map(|p| p.display().to_string()),
            summary: report.summary,
            rows: report.rows,
        }
    }
}

impl Render for CorrelateReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let s = &self.summary;
        writeln!(w, "Correlation: {} <-> {}", self.log.bold(), self.backend.bold())?;
        writeln!(w, "  Report:        {}", self.report_id)?;
        writeln!(w, "  Errors:        {}", s.error_count)?;
        writeln!(w, "  Rows:          {}", s.row_count)?;
        writeln!(
            w,
            "  By request id: {}",
            s.identifier_matches.to_string().green()
        )?;
        writeln!(
            w,
            "  By time:       {}",
            s.time_proximity_matches.to_string().yellow()
        )?;
        writeln!(w, "  Uncorrelated:  {}", s.uncorrelated)?;
        writeln!(
            w,
            "  Lookups:       {} issued, {} failed",
            s.lookups_issued,
            if s.lookups_failed > 0 {
                s.lookups_failed.to_string().red()
            } else {
                s.lookups_failed.to_string().normal()
            }
        )?;
        if let Some(csv) = &self.csv {
            writeln!(w, "  CSV:           {csv}")?;
        }
        Ok(())
    }
}
