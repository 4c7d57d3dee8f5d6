//! CLI error types.

use samlconf_binding::Violation;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The captured response could not be read.
    #[error("invalid response capture: {0}")]
    Capture(String),

    /// The response does not comply with the binding.
    #[error("{0}")]
    Violation(Box<Violation>),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<Violation> for CliError {
    fn from(violation: Violation) -> Self {
        Self::Violation(Box::new(violation))
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
