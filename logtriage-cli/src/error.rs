//! CLI-specific error types and exit code mapping

use logtriage_core::error::TriageError;
use logtriage_correlator::CorrelatorError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Classification rule file could not be loaded or compiled.
    #[error("rule error: {0}")]
    Rule(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logtriage-core.
    #[error("{0}")]
    Core(#[from] TriageError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                 |
    /// |------|-------------------------|
    /// | 0    | Success                 |
    /// | 1    | General / command error |
    /// | 2    | Configuration error     |
    /// | 10   | IO error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(TriageError::Config(_)) => 2,
            Self::Io(_) | Self::Core(TriageError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Rule(_) | Self::Core(_) => 1,
        }
    }
}

impl From<CorrelatorError> for CliError {
    fn from(e: CorrelatorError) -> Self {
        match e {
            CorrelatorError::Config { .. } => Self::Config(e.to_string()),
            CorrelatorError::RuleLoad { .. } | CorrelatorError::InvalidPattern { .. } => {
                Self::Rule(e.to_string())
            }
            CorrelatorError::Io(io) => Self::Io(io),
            other => Self::Command(other.to_string()),
        }
    }
}
