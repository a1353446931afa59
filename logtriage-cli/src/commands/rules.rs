//! `logtriage rules` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logtriage_correlator::{PatternClassifier, RuleLoader};

use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        RulesAction::List { custom } => {
            let config = super::load_config(config_path).await?;
            let classifier = super::build_classifier(custom.as_deref(), &config).await?;
            writer.render(&RuleListReport::from_classifier(&classifier))
        }
        RulesAction::Validate { path } => execute_validate(&path, writer).await,
    }
}

async fn execute_validate(path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %path.display(), "validating classification rules");

    let report = validate_file(path).await;
    writer.render(&report)?;

    match report.error {
        Some(error) => Err(CliError::Rule(error)),
        None => Ok(()),
    }
}

/// Load and compile a rule file, capturing the outcome instead of failing.
pub async fn validate_file(path: &Path) -> RuleValidationReport {
    let (rules, exclusions, error) = match RuleLoader::load_file(path).await {
        Ok(file) => (file.rules.len(), file.exclusions.len(), None),
        Err(e) => (0, 0, Some(e.to_string())),
    };

    RuleValidationReport {
        path: path.display().to_string(),
        valid: error.is_none(),
        rules,
        exclusions,
        error,
    }
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub exclusions: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
pub struct RuleEntry {
    pub priority: usize,
    pub category: String,
    pub pattern: String,
    pub origin: &'static str,
}

impl RuleListReport {
    /// Describe the classifier's rules in priority order.
    pub fn from_classifier(classifier: &PatternClassifier) -> Self {
        let builtin = PatternClassifier::new().rule_count();
        let rules = classifier
            .rules()
            .iter()
            .enumerate()
            .map(|(index, rule)| RuleEntry {
                priority: index + 1,
                category: rule.category.as_str().to_owned(),
                pattern: rule.pattern().to_owned(),
                origin: if index < builtin { "builtin" } else { "custom" },
            })
            .collect::<Vec<_>>();

        Self {
            total: rules.len(),
            exclusions: classifier.exclusion_count(),
            rules,
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Classification Rules ({} total, {} exclusions)",
            self.total.to_string().bold(),
            self.exclusions
        )?;
        writeln!(w)?;
        writeln!(w, "{:<4} {:<24} {:<8} Pattern", "#", "Category", "Origin")?;
        writeln!(w, "{}", "-".repeat(90))?;

        for r in &self.rules {
            let origin = match r.origin {
                "custom" => r.origin.cyan(),
                _ => r.origin.normal(),
            };
            writeln!(
                w,
                "{:<4} {:<24} {:<8} {}",
                r.priority, r.category, origin, r.pattern
            )?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleValidationReport {
    pub path: String,
    pub valid: bool,
    pub rules: usize,
    pub exclusions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Render for RuleValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Validation: {}", self.path.bold())?;
        match &self.error {
            None => writeln!(
                w,
                "  {} ({} rules, {} exclusions)",
                "valid".green(),
                self.rules,
                self.exclusions
            ),
            Some(error) => writeln!(w, "  {}: {}", "invalid".red(), error),
        }
    }
}
