//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O happen here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Configuration file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "logtriage.toml";

/// logtriage -- find errors in mobile bug-report logs and correlate them with backend logs.
///
/// Use `logtriage <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logtriage", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logtriage.toml configuration file.
    ///
    /// When omitted, `./logtriage.toml` is used if present, otherwise built-in defaults.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a frontend log file and list detected errors.
    Scan(ScanArgs),

    /// Scan a log file and correlate its errors with backend log entries.
    Correlate(CorrelateArgs),

    /// Inspect and validate classification rules.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan a frontend log file.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Frontend log file (UTF-8; invalid sequences are replaced).
    pub log: PathBuf,

    /// Extra classification rules (YAML), appended after the built-in rules.
    #[arg(long)]
    pub custom_rules: Option<PathBuf>,
}

// ---- correlate ----

/// Correlate frontend errors with backend log entries.
#[derive(Args, Debug)]
pub struct CorrelateArgs {
    /// Frontend log file (UTF-8; invalid sequences are replaced).
    pub log: PathBuf,

    /// Backend entries as a JSON array or JSON lines.
    #[arg(long)]
    pub backend: PathBuf,

    /// Write the correlation table as CSV to this file instead of stdout.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Backend entry deduplication scope (overrides the config file).
    #[arg(long)]
    pub dedup: Option<DedupArg>,

    /// UTC offset of the client clock, e.g. -04:00 (overrides the config file).
    #[arg(long, allow_hyphen_values = true)]
    pub client_offset: Option<String>,

    /// Date used to complete partial timestamps, YYYY-MM-DD (overrides the config file).
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Extra classification rules (YAML), appended after the built-in rules.
    #[arg(long)]
    pub custom_rules: Option<PathBuf>,
}

/// `--dedup` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DedupArg {
    /// Deduplicate backend entries within each error only.
    PerError,
    /// Emit each backend entry at most once across the whole table.
    Global,
}

impl DedupArg {
    /// Config file spelling of the scope.
    pub fn as_config_value(self) -> &'static str {
        match self {
            Self::PerError => "per_error",
            Self::Global => "global",
        }
    }
}

// ---- rules ----

/// Inspect classification rules.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List the active classification rules in priority order.
    List {
        /// Also load rules from this YAML file.
        #[arg(long)]
        custom: Option<PathBuf>,
    },
    /// Validate a YAML rule file without using it.
    Validate {
        /// YAML rule file.
        path: PathBuf,
    },
}

// ---- config ----

/// Manage logtriage configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scanner, correlation, lookup).
        #[arg(long)]
        section: Option<String>,
    },
}
