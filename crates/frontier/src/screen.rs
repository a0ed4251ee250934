//! Sector screen pipeline
//!
//! ```text
//! statistics -> feature table -> filter -> missing / negative handling
//!            -> DEA (valuation inputs, operating outputs) -> ranking -> report
//! ```
//!
//! Inputs are valuation ratios (lower is cheaper), outputs are operating
//! metrics (higher is better). A low efficiency score marks a stock whose
//! valuation buys little operating quality relative to its peers.

use frontier_data::{DataError, FeatureTable, FilterSet, MissingPolicy, StatisticRow, metric_key};
use frontier_dea::{DeaConfig, DeaError, DeaModel, MetricMatrix};
use frontier_output::{ExcludedUnit, ReportBuilder, ReportError, ScreenReport, ScreenRow};
use frontier_rank::{RankConfig, RankError, select_top};
use ndarray::{ArrayViewMut1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Column carrying market capitalisation, used for presentation only.
pub const MARKET_CAP_METRIC: &str = "Market Cap";

/// Screen pipeline errors
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Ingestion, parsing or filter error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// DEA model construction error
    #[error("DEA error: {0}")]
    Dea(#[from] DeaError),

    /// Ranking error
    #[error("Ranking error: {0}")]
    Rank(#[from] RankError),

    /// Report assembly error
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A negative value under [`NegativePolicy::Reject`]
    #[error("Negative value {value} for {ticker}, metric {metric:?}")]
    NegativeValue {
        /// Ticker symbol
        ticker: String,
        /// Metric name
        metric: String,
        /// Offending value
        value: f64,
    },
}

/// Treatment of negative metric values, which DEA cannot score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePolicy {
    /// Leave the ticker out of the screen
    #[default]
    DropUnit,
    /// Replace negative values with zero
    ClampToZero,
    /// Fail the screen
    Reject,
}

/// Screen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Sector or universe label
    pub sector: String,
    /// Valuation metrics used as DEA inputs
    pub inputs: Vec<String>,
    /// Operating metrics used as DEA outputs
    pub outputs: Vec<String>,
    /// Further metrics pivoted for filters, outside the DEA
    pub features: Vec<String>,
    /// Filter applied before DEA, e.g. `Return on Assets < 42.81 and Diluted EPS > 8.345`
    pub filter: String,
    /// Number of tickers to report (default: 10)
    pub count: usize,
    /// Ranking configuration
    pub rank: RankConfig,
    /// DEA configuration
    pub dea: DeaConfig,
    /// Treatment of missing input and output cells
    pub missing: MissingPolicy,
    /// Treatment of negative input and output values
    pub negative: NegativePolicy,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            sector: "Information Technology".to_string(),
            inputs: names(&[
                "Trailing P/E",
                "Forward P/E",
                "Enterprise Value/Revenue",
                "Enterprise Value/EBITDA",
                "Price/Book",
                "PEG Ratio",
                "Price/Sales",
            ]),
            outputs: names(&[
                "Operating Margin",
                "Profit Margin",
                "Revenue Per Share",
                "Return on Assets",
                "Return on Equity",
                "Diluted EPS",
            ]),
            features: names(&["Beta"]),
            filter: String::new(),
            count: 10,
            rank: RankConfig::default(),
            dea: DeaConfig::default(),
            missing: MissingPolicy::FillZero,
            negative: NegativePolicy::DropUnit,
        }
    }
}

impl ScreenConfig {
    /// Load a configuration from a JSON file. Absent fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScreenError> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ScreenError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check metric lists and the ranking band.
    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.inputs.is_empty() {
            return Err(ScreenError::InvalidConfig("no input metrics".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(ScreenError::InvalidConfig("no output metrics".to_string()));
        }
        if let Some(shared) = self.inputs.iter().find(|m| self.outputs.contains(m)) {
            return Err(ScreenError::InvalidConfig(format!(
                "{shared:?} is both an input and an output"
            )));
        }
        self.rank.validate()?;
        Ok(())
    }

    /// Every metric the screen reads: inputs, outputs, features, metrics
    /// named by the filter and market cap.
    ///
    /// A filter metric written with underscores (`Return_on_Assets`) maps to
    /// the configured metric it folds to, or else to its spaced form.
    pub fn metrics(&self) -> Vec<String> {
        let mut metrics: Vec<String> = Vec::new();
        let mut push = |metric: String| {
            let key = metric_key(&metric);
            if !metrics.iter().any(|m| metric_key(m) == key) {
                metrics.push(metric);
            }
        };

        for metric in self.inputs.iter().chain(&self.outputs).chain(&self.features) {
            push(metric.clone());
        }
        // Parse errors surface when the screen runs.
        if let Ok(filter) = self.filter.parse::<FilterSet>() {
            for clause in filter.clauses() {
                push(clause.metric.replace('_', " "));
            }
        }
        push(MARKET_CAP_METRIC.to_string());

        metrics
    }
}

/// Runs the screen pipeline under one configuration
#[derive(Debug, Clone)]
pub struct Screener {
    config: ScreenConfig,
}

impl Screener {
    /// Create a screener, validating the configuration.
    pub fn new(config: ScreenConfig) -> Result<Self, ScreenError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Screen configuration.
    pub const fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Pivot statistic rows into a feature table with every metric the
    /// screen reads. Missing cells stay null until [`Self::run`] resolves them.
    pub fn feature_table(&self, rows: &[StatisticRow]) -> Result<FeatureTable, ScreenError> {
        Ok(FeatureTable::from_statistics(
            rows,
            &self.config.metrics(),
            MissingPolicy::Keep,
        )?)
    }

    /// Screen raw statistic rows.
    pub fn run_statistics(&self, rows: &[StatisticRow]) -> Result<ScreenReport, ScreenError> {
        self.run(&self.feature_table(rows)?)
    }

    /// Screen a feature table.
    pub fn run(&self, table: &FeatureTable) -> Result<ScreenReport, ScreenError> {
        let config = &self.config;
        let universe = table.tickers()?;

        let filter: FilterSet = config.filter.parse()?;
        let mut screened: Vec<String> =
            config.inputs.iter().chain(&config.outputs).cloned().collect();
        for clause in filter.clauses() {
            let metric = table.resolve_metric(&clause.metric)?;
            if !screened.contains(&metric) {
                screened.push(metric);
            }
        }

        let (complete, mut excluded) = self.resolve_missing(table, &screened)?;
        let candidates = complete.tickers()?;

        let filtered = complete.filter(&filter)?;
        let tickers = filtered.tickers()?;

        let passed: HashSet<&str> = tickers.iter().map(String::as_str).collect();
        excluded.extend(
            candidates
                .iter()
                .filter(|t| !passed.contains(t.as_str()))
                .map(|t| ExcludedUnit::new(t.as_str(), "filtered out")),
        );

        let mut inputs = filtered.matrix(&config.inputs)?;
        let mut outputs = filtered.matrix(&config.outputs)?;

        let mut keep = Vec::with_capacity(tickers.len());
        for (i, ticker) in tickers.iter().enumerate() {
            let reason = match self.clean_row(ticker, inputs.row_mut(i), &config.inputs)? {
                Some(reason) => Some(reason),
                None => self.clean_row(ticker, outputs.row_mut(i), &config.outputs)?,
            };
            match reason {
                Some(reason) => {
                    tracing::info!(ticker = %ticker, %reason, "ticker excluded");
                    excluded.push(ExcludedUnit::new(ticker.as_str(), reason));
                }
                None => keep.push(i),
            }
        }

        let units: Vec<String> = keep.iter().map(|&i| tickers[i].clone()).collect();
        let model = DeaModel::new(
            MetricMatrix::new(
                units.clone(),
                config.inputs.clone(),
                inputs.select(Axis(0), &keep),
            )?,
            MetricMatrix::new(units, config.outputs.clone(), outputs.select(Axis(0), &keep))?,
            config.dea.clone(),
        )?;

        let solution = model.solve();
        let ranked = select_top(&solution.efficiency(), config.count, &config.rank)?;

        let statuses = solution.statuses();
        excluded.extend(ranked.excluded.iter().map(|unit| {
            let status = statuses
                .get(unit)
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            ExcludedUnit::new(unit.as_str(), format!("program {status}"))
        }));

        let market_caps = market_caps(&filtered)?;
        let rows: Vec<ScreenRow> = ranked
            .units
            .iter()
            .map(|unit| ScreenRow {
                rank: unit.position,
                ticker: unit.unit.clone(),
                efficiency: unit.efficiency,
                normalized: unit.normalized,
                market_cap_billions: market_caps.get(&unit.unit).copied(),
            })
            .collect();

        tracing::info!(
            universe = universe.len(),
            evaluated = keep.len(),
            selected = rows.len(),
            "screen complete"
        );

        Ok(ReportBuilder::new()
            .sector(config.sector.as_str())
            .policy(config.rank.policy)
            .filter(filter.to_string())
            .counts(universe.len(), keep.len())
            .rows(rows)
            .exclude_all(excluded)
            .status_counts(solution.status_counts())
            .weights(solution.weights())
            .build()?)
    }

    /// Apply the missing-cell policy to the screened metrics before
    /// filtering. Returns the resolved table and the tickers it dropped.
    fn resolve_missing(
        &self,
        table: &FeatureTable,
        metrics: &[String],
    ) -> Result<(FeatureTable, Vec<ExcludedUnit>), ScreenError> {
        match self.config.missing {
            MissingPolicy::FillZero => Ok((table.fill_missing(metrics, 0.0)?, Vec::new())),
            MissingPolicy::Keep => Ok((table.clone(), Vec::new())),
            MissingPolicy::DropUnit => {
                let columns = metrics
                    .iter()
                    .map(|m| table.column(m))
                    .collect::<frontier_data::Result<Vec<_>>>()?;

                let mut mask = Vec::with_capacity(table.len());
                let mut dropped = Vec::new();
                for (i, ticker) in table.tickers()?.into_iter().enumerate() {
                    let gap = metrics
                        .iter()
                        .zip(&columns)
                        .find(|(_, column)| !column[i].is_some_and(f64::is_finite));
                    match gap {
                        Some((metric, _)) => {
                            tracing::info!(ticker = %ticker, %metric, "ticker missing a metric");
                            dropped.push(ExcludedUnit::new(ticker, format!("missing {metric}")));
                            mask.push(false);
                        }
                        None => mask.push(true),
                    }
                }
                Ok((table.retain(&mask)?, dropped))
            }
        }
    }

    /// Resolve missing and negative cells in place. Returns the exclusion
    /// reason when the ticker must leave the screen.
    fn clean_row(
        &self,
        ticker: &str,
        mut row: ArrayViewMut1<'_, f64>,
        metrics: &[String],
    ) -> Result<Option<String>, ScreenError> {
        for (value, metric) in row.iter_mut().zip(metrics) {
            if !value.is_finite() {
                match self.config.missing {
                    MissingPolicy::DropUnit => return Ok(Some(format!("missing {metric}"))),
                    MissingPolicy::FillZero | MissingPolicy::Keep => *value = 0.0,
                }
            } else if *value < 0.0 {
                match self.config.negative {
                    NegativePolicy::DropUnit => return Ok(Some(format!("negative {metric}"))),
                    NegativePolicy::ClampToZero => *value = 0.0,
                    NegativePolicy::Reject => {
                        return Err(ScreenError::NegativeValue {
                            ticker: ticker.to_string(),
                            metric: metric.clone(),
                            value: *value,
                        });
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Market cap in billions per ticker, empty when the column is absent.
fn market_caps(table: &FeatureTable) -> Result<HashMap<String, f64>, ScreenError> {
    if !table.has_metric(MARKET_CAP_METRIC) {
        return Ok(HashMap::new());
    }

    Ok(table
        .tickers()?
        .into_iter()
        .zip(table.column(MARKET_CAP_METRIC)?)
        .filter_map(|(ticker, cap)| cap.filter(|c| c.is_finite()).map(|c| (ticker, c / 1e9)))
        .collect())
}
