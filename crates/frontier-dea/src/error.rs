//! DEA model errors

use thiserror::Error;

/// Errors raised while building a DEA model.
///
/// Per-unit solver failures are not errors: they are recorded in the unit's
/// status and leave its efficiency as NaN.
#[derive(Debug, Error)]
pub enum DeaError {
    /// Shapes disagree (unit counts, key or metric name counts)
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Inputs and outputs list units in a different order
    #[error("Unit mismatch at row {index}: inputs have {input:?}, outputs have {output:?}")]
    UnitMismatch {
        /// Row index
        index: usize,
        /// Unit key in the inputs matrix
        input: String,
        /// Unit key in the outputs matrix
        output: String,
    },

    /// A unit index past the last row
    #[error("Unit index {index} out of range for {units} units")]
    UnitOutOfRange {
        /// Requested index
        index: usize,
        /// Number of units
        units: usize,
    },

    /// A unit key appears more than once
    #[error("Duplicate unit: {0}")]
    DuplicateUnit(String),

    /// Units were supplied without any input or output metric
    #[error("No {0} metrics supplied")]
    EmptyMetrics(&'static str),

    /// A value is negative, NaN or infinite
    #[error("Invalid value {value} for unit {unit:?}, metric {metric:?}")]
    InvalidValue {
        /// Unit key
        unit: String,
        /// Metric name
        metric: String,
        /// Offending value
        value: f64,
    },
}
