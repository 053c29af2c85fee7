//! Error types for tabula

use thiserror::Error;

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Unified error type for all tabula operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TabulaError {
    /// Invalid store configuration (no columns, too many columns)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller-supplied argument (empty update, non-record row, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Placeholder count in a WHERE condition does not match the arguments
    #[error(
        "number of arguments required in the 'where' clause ({expected}) is not the same as the number of provided arguments ({actual})"
    )]
    ArgumentCount { expected: usize, actual: usize },

    /// Integer outside the IEEE 754 safe range
    #[error("Precision loss: {0}")]
    PrecisionLoss(String),

    /// Non-string value written into a formula column
    #[error("value of column {column} is not a string, but expected to contain formula")]
    FormulaType { column: String },

    /// Column name not present in the store schema
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Key-value lookup found nothing
    #[error("error key not found: {0}")]
    KeyNotFound(String),

    /// Stored value could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Formula evaluation or result shape was not what the store expected
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Transport or backend failure
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TabulaError {
    /// Returns true if this error means the key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, TabulaError::KeyNotFound(_))
    }

    /// Returns true if the error was caused by caller input rather than the backend
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            TabulaError::InvalidArgument(_)
                | TabulaError::ArgumentCount { .. }
                | TabulaError::FormulaType { .. }
                | TabulaError::UnknownColumn(_)
                | TabulaError::PrecisionLoss(_)
        )
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::Serialization(err.to_string())
    }
}
