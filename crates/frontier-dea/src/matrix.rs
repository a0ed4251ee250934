//! Unit-by-metric matrices
//!
//! A [`MetricMatrix`] pairs a dense `U x M` array with the unit keys labelling
//! its rows and the metric names labelling its columns. Construction validates
//! shape, key uniqueness and values; once built the matrix is immutable.

use crate::error::DeaError;
use ndarray::{Array2, ArrayView1};
use std::collections::HashSet;

/// Validated units x metrics matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatrix {
    units: Vec<String>,
    metrics: Vec<String>,
    values: Array2<f64>,
}

impl MetricMatrix {
    /// Create a matrix.
    ///
    /// # Errors
    /// - [`DeaError::DimensionMismatch`] if `units` or `metrics` disagree with the shape of `values`
    /// - [`DeaError::DuplicateUnit`] if a unit key repeats
    /// - [`DeaError::InvalidValue`] if any value is negative, NaN or infinite
    pub fn new(
        units: Vec<String>,
        metrics: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, DeaError> {
        let (n_units, n_metrics) = values.dim();

        if units.len() != n_units {
            return Err(DeaError::DimensionMismatch(format!(
                "{} unit keys for {} rows",
                units.len(),
                n_units
            )));
        }
        if metrics.len() != n_metrics {
            return Err(DeaError::DimensionMismatch(format!(
                "{} metric names for {} columns",
                metrics.len(),
                n_metrics
            )));
        }

        let mut seen = HashSet::with_capacity(units.len());
        for unit in &units {
            if !seen.insert(unit.as_str()) {
                return Err(DeaError::DuplicateUnit(unit.clone()));
            }
        }

        for ((row, col), &value) in values.indexed_iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(DeaError::InvalidValue {
                    unit: units[row].clone(),
                    metric: metrics[col].clone(),
                    value,
                });
            }
        }

        Ok(Self {
            units,
            metrics,
            values,
        })
    }

    /// Create a matrix keyed by row position (`"0"`, `"1"`, ...).
    pub fn from_array(metrics: Vec<String>, values: Array2<f64>) -> Result<Self, DeaError> {
        let units = (0..values.nrows()).map(|i| i.to_string()).collect();
        Self::new(units, metrics, values)
    }

    /// Unit keys in row order.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Metric names in column order.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Underlying values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Values of one unit.
    pub fn row(&self, unit: usize) -> ArrayView1<'_, f64> {
        self.values.row(unit)
    }

    /// Number of units (rows).
    pub fn n_units(&self) -> usize {
        self.values.nrows()
    }

    /// Number of metrics (columns).
    pub fn n_metrics(&self) -> usize {
        self.values.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_valid_matrix() {
        let m = MetricMatrix::new(
            vec!["AAPL".into(), "MSFT".into()],
            vec!["Trailing P/E".into()],
            array![[31.2], [36.5]],
        )
        .unwrap();

        assert_eq!(m.n_units(), 2);
        assert_eq!(m.n_metrics(), 1);
        assert_eq!(m.units()[1], "MSFT");
        assert_eq!(m.row(1)[0], 36.5);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = MetricMatrix::new(names("u", 3), names("m", 1), array![[1.0], [2.0]]);
        assert!(matches!(err, Err(DeaError::DimensionMismatch(_))));

        let err = MetricMatrix::new(names("u", 2), names("m", 2), array![[1.0], [2.0]]);
        assert!(matches!(err, Err(DeaError::DimensionMismatch(_))));
    }

    #[test]
    fn test_duplicate_unit() {
        let err = MetricMatrix::new(
            vec!["AAPL".into(), "AAPL".into()],
            names("m", 1),
            array![[1.0], [2.0]],
        );
        assert!(matches!(err, Err(DeaError::DuplicateUnit(u)) if u == "AAPL"));
    }

    #[test]
    fn test_invalid_values() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = MetricMatrix::from_array(names("m", 1), array![[1.0], [bad]]);
            assert!(matches!(
                err,
                Err(DeaError::InvalidValue { ref unit, .. }) if unit == "1"
            ));
        }
    }

    #[test]
    fn test_empty_matrix() {
        let m = MetricMatrix::from_array(Vec::new(), Array2::zeros((0, 0))).unwrap();
        assert_eq!(m.n_units(), 0);
    }
}
