//! Screen report.

use chrono::{DateTime, Utc};
use frontier_dea::WeightRecord;
use frontier_rank::RankPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required field was not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One ranked ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenRow {
    /// 1-based rank, cheapest first.
    pub rank: usize,

    /// Ticker symbol.
    pub ticker: String,

    /// DEA efficiency score.
    pub efficiency: f64,

    /// Winsorized normal score, when the normalized policy was used.
    pub normalized: Option<f64>,

    /// Market capitalisation in billions, when known.
    pub market_cap_billions: Option<f64>,
}

/// A ticker left out of the screen and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcludedUnit {
    /// Ticker symbol.
    pub ticker: String,

    /// Reason for exclusion.
    pub reason: String,
}

impl ExcludedUnit {
    /// Create a new exclusion record.
    pub fn new(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}

/// Result of one screen run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenReport {
    /// Sector or universe label.
    pub sector: String,

    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Ranking policy used.
    pub policy: RankPolicy,

    /// Filter applied before DEA, in textual form.
    pub filter: Option<String>,

    /// Tickers in the feature table before filtering.
    pub universe: usize,

    /// Tickers evaluated by DEA.
    pub evaluated: usize,

    /// Ranked tickers, cheapest first.
    pub rows: Vec<ScreenRow>,

    /// Tickers dropped along the way.
    pub excluded: Vec<ExcludedUnit>,

    /// Number of DEA programs per solver status.
    pub status_counts: BTreeMap<String, usize>,

    /// Solved DEA weights per ticker.
    pub weights: BTreeMap<String, WeightRecord>,
}

impl ScreenReport {
    /// Tickers in ranked order.
    pub fn tickers(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.ticker.as_str()).collect()
    }

    /// Number of units whose program reached optimality.
    pub fn optimal(&self) -> usize {
        self.status_counts.get("Optimal").copied().unwrap_or(0)
    }

    /// Convert report to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating screen reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    sector: Option<String>,
    policy: RankPolicy,
    filter: Option<String>,
    universe: usize,
    evaluated: usize,
    rows: Vec<ScreenRow>,
    excluded: Vec<ExcludedUnit>,
    status_counts: BTreeMap<String, usize>,
    weights: BTreeMap<String, WeightRecord>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sector label.
    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Set the ranking policy.
    pub const fn policy(mut self, policy: RankPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the filter description. Empty strings are ignored.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    /// Set the universe and evaluated counts.
    pub const fn counts(mut self, universe: usize, evaluated: usize) -> Self {
        self.universe = universe;
        self.evaluated = evaluated;
        self
    }

    /// Set the ranked rows.
    pub fn rows(mut self, rows: Vec<ScreenRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Add an excluded ticker.
    pub fn exclude(mut self, unit: ExcludedUnit) -> Self {
        self.excluded.push(unit);
        self
    }

    /// Add excluded tickers.
    pub fn exclude_all(mut self, units: impl IntoIterator<Item = ExcludedUnit>) -> Self {
        self.excluded.extend(units);
        self
    }

    /// Set the per-status counts.
    pub fn status_counts(mut self, counts: BTreeMap<String, usize>) -> Self {
        self.status_counts = counts;
        self
    }

    /// Set the solved weights.
    pub fn weights(mut self, weights: BTreeMap<String, WeightRecord>) -> Self {
        self.weights = weights;
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<ScreenReport, ReportError> {
        Ok(ScreenReport {
            sector: self.sector.ok_or(ReportError::MissingField("sector"))?,
            generated_at: Utc::now(),
            policy: self.policy,
            filter: self.filter,
            universe: self.universe,
            evaluated: self.evaluated,
            rows: self.rows,
            excluded: self.excluded,
            status_counts: self.status_counts,
            weights: self.weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_builder() {
        let mut counts = BTreeMap::new();
        counts.insert("Optimal".to_string(), 3);
        counts.insert("Infeasible".to_string(), 1);

        let report = ReportBuilder::new()
            .sector("Technology")
            .policy(RankPolicy::Raw)
            .filter("")
            .counts(10, 4)
            .rows(vec![ScreenRow {
                rank: 1,
                ticker: "INTC".to_string(),
                efficiency: 0.41,
                normalized: None,
                market_cap_billions: Some(92.5),
            }])
            .exclude(ExcludedUnit::new("XYZ", "negative Trailing P/E"))
            .status_counts(counts)
            .build()
            .unwrap();

        assert_eq!(report.sector, "Technology");
        assert!(report.filter.is_none());
        assert_eq!(report.tickers(), vec!["INTC"]);
        assert_eq!(report.optimal(), 3);
        assert_eq!(report.excluded.len(), 1);
    }

    #[test]
    fn test_report_builder_requires_sector() {
        assert!(matches!(
            ReportBuilder::new().build(),
            Err(ReportError::MissingField("sector"))
        ));
    }

    #[test]
    fn test_report_json() {
        let report = ReportBuilder::new().sector("Energy").build().unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"sector\": \"Energy\""));
        assert!(json.contains("\"policy\": \"normalized\""));
    }
}
