//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// A raw value could not be converted to a number
    #[error("Cannot parse value {raw:?}: {reason}")]
    Parse {
        /// The raw text that failed to parse
        raw: String,
        /// Reason for the failure
        reason: String,
    },

    /// CSV read error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A metric column was requested that the table does not have
    #[error("Missing metric column: {0}")]
    MissingColumn(String),

    /// A filter expression could not be parsed
    #[error("Invalid filter {expression:?}: {reason}")]
    InvalidFilter {
        /// The offending expression
        expression: String,
        /// Reason for rejection
        reason: String,
    },
}
