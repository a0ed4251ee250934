//! Feature table.
//!
//! Pivots long statistic rows into one row per ticker and one `f64` column
//! per requested metric, backed by a polars `DataFrame`.

use crate::error::{DataError, Result};
use crate::filter::{Clause, FilterSet};
use crate::normalize::parse_optional;
use crate::statistics::StatisticRow;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the key column.
pub const TICKER_COLUMN: &str = "ticker";

/// What to do with cells that are absent or unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Replace missing cells with zero
    #[default]
    FillZero,
    /// Drop any ticker with a missing cell
    DropUnit,
    /// Leave missing cells null for the caller to resolve
    Keep,
}

/// Column-name key with spaces and slashes folded to underscores, so
/// `Enterprise Value/EBITDA` and `Enterprise_Value_EBITDA` compare equal.
pub fn metric_key(name: &str) -> String {
    name.replace([' ', '/'], "_")
}

/// Tickers by metrics, one row per ticker.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    df: DataFrame,
}

impl FeatureTable {
    /// Build a table from scraped statistic rows.
    ///
    /// Attributes are matched against `metrics` after
    /// [`clean_attribute`](crate::statistics::clean_attribute). Duplicate
    /// cells for the same ticker and metric are averaged. Tickers keep the
    /// order in which they first appear.
    pub fn from_statistics(
        rows: &[StatisticRow],
        metrics: &[String],
        missing: MissingPolicy,
    ) -> Result<Self> {
        let mut metric_names: Vec<&str> = Vec::new();
        for metric in metrics {
            if metric != TICKER_COLUMN && !metric_names.contains(&metric.as_str()) {
                metric_names.push(metric);
            }
        }
        let metric_index: HashMap<&str, usize> = metric_names
            .iter()
            .enumerate()
            .map(|(i, m)| (*m, i))
            .collect();

        let mut tickers: Vec<String> = Vec::new();
        let mut ticker_index: HashMap<String, usize> = HashMap::new();
        // (sum, count) per ticker and metric
        let mut cells: Vec<Vec<(f64, usize)>> = Vec::new();

        for row in rows {
            let t = *ticker_index.entry(row.ticker.clone()).or_insert_with(|| {
                tickers.push(row.ticker.clone());
                cells.push(vec![(0.0, 0); metric_names.len()]);
                tickers.len() - 1
            });

            let Some(&m) = metric_index.get(row.metric().as_str()) else {
                continue;
            };

            match parse_optional(row.value.as_str()) {
                Some(value) => {
                    let cell = &mut cells[t][m];
                    cell.0 += value;
                    cell.1 += 1;
                }
                None => {
                    tracing::debug!(
                        ticker = %row.ticker,
                        attribute = %row.attribute,
                        value = %row.value,
                        "unparseable statistic treated as missing"
                    );
                }
            }
        }

        for (m, name) in metric_names.iter().enumerate() {
            if cells.iter().all(|row| row[m].1 == 0) {
                tracing::warn!(metric = %name, "metric not found for any ticker");
            }
        }

        let mut keep: Vec<usize> = Vec::with_capacity(tickers.len());
        for (t, ticker) in tickers.iter().enumerate() {
            let complete = cells[t].iter().all(|(_, count)| *count > 0);
            if complete || missing != MissingPolicy::DropUnit {
                keep.push(t);
            } else {
                tracing::warn!(ticker = %ticker, "dropping ticker with missing metrics");
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(metric_names.len() + 1);
        let kept_tickers: Vec<String> = keep.iter().map(|&t| tickers[t].clone()).collect();
        columns.push(Series::new(TICKER_COLUMN.into(), kept_tickers).into());

        for (m, name) in metric_names.iter().enumerate() {
            let values: Vec<Option<f64>> = keep
                .iter()
                .map(|&t| match cells[t][m] {
                    (sum, count) if count > 0 => Some(sum / count as f64),
                    _ if missing == MissingPolicy::Keep => None,
                    _ => Some(0.0),
                })
                .collect();
            columns.push(Series::new((*name).into(), values).into());
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Wrap an existing DataFrame that has a `ticker` column.
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        if df.column(TICKER_COLUMN).is_err() {
            return Err(DataError::MissingColumn(TICKER_COLUMN.to_string()));
        }
        Ok(Self { df })
    }

    /// Underlying DataFrame.
    pub const fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Whether the table has no tickers.
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Tickers in row order.
    pub fn tickers(&self) -> Result<Vec<String>> {
        let tickers = self.df.column(TICKER_COLUMN)?.str()?;
        Ok(tickers
            .into_iter()
            .map(|t| t.unwrap_or_default().to_string())
            .collect())
    }

    /// Metric column names, excluding the ticker column.
    pub fn metric_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != TICKER_COLUMN)
            .collect()
    }

    /// Whether the table has the given metric column.
    pub fn has_metric(&self, name: &str) -> bool {
        name != TICKER_COLUMN && self.df.column(name).is_ok()
    }

    /// Values of one metric column.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        if !self.has_metric(name) {
            return Err(DataError::MissingColumn(name.to_string()));
        }
        let values = self.df.column(name)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Resolve a metric name, accepting underscores in place of spaces and
    /// slashes (`Return_on_Assets`, `Trailing_P_E`).
    pub fn resolve_metric(&self, name: &str) -> Result<String> {
        if self.has_metric(name) {
            return Ok(name.to_string());
        }
        let spaced = name.replace('_', " ");
        if self.has_metric(&spaced) {
            return Ok(spaced);
        }
        let key = metric_key(name);
        self.metric_names()
            .into_iter()
            .find(|metric| metric_key(metric) == key)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Replace null cells of the given metric columns with `value`.
    pub fn fill_missing(&self, metrics: &[String], value: f64) -> Result<Self> {
        if let Some(missing) = metrics.iter().find(|m| !self.has_metric(m)) {
            return Err(DataError::MissingColumn(missing.clone()));
        }
        if metrics.is_empty() {
            return Ok(self.clone());
        }

        let exprs: Vec<Expr> = metrics
            .iter()
            .map(|m| col(m.as_str()).fill_null(lit(value)))
            .collect();
        let df = self.df.clone().lazy().with_columns(exprs).collect()?;
        Ok(Self { df })
    }

    /// Keep only the tickers matching every clause of `filter`.
    pub fn filter(&self, filter: &FilterSet) -> Result<Self> {
        let resolved = FilterSet::new(
            filter
                .clauses()
                .iter()
                .map(|c| {
                    let metric = self.resolve_metric(&c.metric)?;
                    Ok(Clause::new(metric, c.comparator, c.threshold))
                })
                .collect::<Result<Vec<_>>>()?,
        );

        let Some(predicate) = resolved.to_expr() else {
            return Ok(self.clone());
        };

        let df = self.df.clone().lazy().filter(predicate).collect()?;
        tracing::debug!(before = self.len(), after = df.height(), filter = %resolved, "applied filter");
        Ok(Self { df })
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn retain(&self, mask: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Self {
            df: self.df.filter(&mask)?,
        })
    }

    /// Dense tickers-by-metrics matrix for the requested columns.
    ///
    /// Null cells become NaN; callers validate before use.
    pub fn matrix(&self, metrics: &[String]) -> Result<Array2<f64>> {
        let columns = metrics
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Array2::from_shape_fn(
            (self.len(), metrics.len()),
            |(row, col)| columns[col][row].unwrap_or(f64::NAN),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows() -> Vec<StatisticRow> {
        vec![
            StatisticRow::new("AAPL", "Trailing P/E", "31.2"),
            StatisticRow::new("AAPL", "Return on Equity (ttm)", "147.25%"),
            StatisticRow::new("AAPL", "Market Cap (intraday)", "2.95T"),
            StatisticRow::new("MSFT", "Trailing P/E", "36.5"),
            StatisticRow::new("MSFT", "Return on Equity (ttm)", "n/a"),
            StatisticRow::new("NVDA", "Trailing P/E", "60.0"),
            StatisticRow::new("NVDA", "Trailing P/E", "70.0"),
            StatisticRow::new("NVDA", "Return on Equity (ttm)", "115.7%"),
            StatisticRow::new("NVDA", "Beta (5Y Monthly)", "1.68"),
        ]
    }

    fn metrics() -> Vec<String> {
        vec!["Trailing P/E".to_string(), "Return on Equity".to_string()]
    }

    #[test]
    fn test_pivot_fill_zero() {
        let table = FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::FillZero)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.tickers().unwrap(), vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(table.metric_names(), metrics());

        let roe = table.column("Return on Equity").unwrap();
        assert_eq!(roe, vec![Some(147.25), Some(0.0), Some(115.7)]);

        // Duplicate cells are averaged
        let pe = table.column("Trailing P/E").unwrap();
        assert_relative_eq!(pe[2].unwrap(), 65.0);
    }

    #[test]
    fn test_pivot_drop_unit() {
        let table =
            FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::DropUnit).unwrap();
        assert_eq!(table.tickers().unwrap(), vec!["AAPL", "NVDA"]);
    }

    #[test]
    fn test_pivot_keep_missing() {
        let table =
            FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::Keep).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("Return on Equity").unwrap()[1], None);

        let matrix = table.matrix(&["Return on Equity".to_string()]).unwrap();
        assert!(matrix[[1, 0]].is_nan());
    }

    #[test]
    fn test_fill_missing() {
        let table =
            FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::Keep).unwrap();
        let filled = table
            .fill_missing(&["Return on Equity".to_string()], 0.0)
            .unwrap();
        assert_eq!(
            filled.column("Return on Equity").unwrap(),
            vec![Some(147.25), Some(0.0), Some(115.7)]
        );
        assert!(table.fill_missing(&["Beta".to_string()], 0.0).is_err());
    }

    #[test]
    fn test_resolve_metric() {
        let metrics = vec![
            "Trailing P/E".to_string(),
            "Enterprise Value/EBITDA".to_string(),
            "Return on Assets".to_string(),
        ];
        let rows = vec![
            StatisticRow::new("A", "Trailing P/E", "12"),
            StatisticRow::new("A", "Enterprise Value/EBITDA", "9.5"),
            StatisticRow::new("A", "Return on Assets (ttm)", "4%"),
        ];
        let table = FeatureTable::from_statistics(&rows, &metrics, MissingPolicy::Keep).unwrap();

        assert_eq!(table.resolve_metric("Trailing P/E").unwrap(), "Trailing P/E");
        assert_eq!(table.resolve_metric("Return_on_Assets").unwrap(), "Return on Assets");
        assert_eq!(table.resolve_metric("Trailing_P_E").unwrap(), "Trailing P/E");
        assert_eq!(
            table.resolve_metric("Enterprise_Value_EBITDA").unwrap(),
            "Enterprise Value/EBITDA"
        );
        assert!(matches!(
            table.resolve_metric("Price_Book"),
            Err(DataError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let table = FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::FillZero)
            .unwrap();
        assert!(matches!(
            table.column("Beta"),
            Err(DataError::MissingColumn(name)) if name == "Beta"
        ));
        assert!(!table.has_metric(TICKER_COLUMN));
    }

    #[test]
    fn test_matrix() {
        let table = FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::FillZero)
            .unwrap();
        let matrix = table
            .matrix(&["Return on Equity".to_string(), "Trailing P/E".to_string()])
            .unwrap();

        assert_eq!(matrix.dim(), (3, 2));
        assert_relative_eq!(matrix[[0, 0]], 147.25);
        assert_relative_eq!(matrix[[1, 1]], 36.5);
    }

    #[test]
    fn test_retain() {
        let table = FeatureTable::from_statistics(&rows(), &metrics(), MissingPolicy::FillZero)
            .unwrap();
        let kept = table.retain(&[false, true, true]).unwrap();
        assert_eq!(kept.tickers().unwrap(), vec!["MSFT", "NVDA"]);
    }

    #[test]
    fn test_from_dataframe_requires_ticker() {
        let df = DataFrame::new(vec![Series::new("x".into(), vec![1.0, 2.0]).into()]).unwrap();
        assert!(FeatureTable::from_dataframe(df).is_err());
    }
}
