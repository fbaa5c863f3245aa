use thiserror::Error;

/// Errors returned when validating configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid batch configuration: {0}")]
    InvalidBatch(String),

    #[error("invalid restart configuration: {0}")]
    InvalidRestart(String),

    #[error("invalid source configuration: {0}")]
    InvalidSource(String),
}
