//! Ranking policies and top-N selection

use crate::transform::{normal_scores, winsorize};
use crate::{RankError, Result};
use frontier_dea::{EfficiencyRow, EfficiencyTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How efficiency scores are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Ascending on the raw score
    Raw,
    /// Ascending on the winsorized normal score
    #[default]
    Normalized,
}

impl fmt::Display for RankPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Normalized => f.write_str("normalized"),
        }
    }
}

impl FromStr for RankPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "normalized" | "normalised" => Ok(Self::Normalized),
            other => Err(format!("unknown rank policy: {other}")),
        }
    }
}

/// Treatment of units without a score (non-optimal programs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// Drop them before ranking
    #[default]
    Exclude,
    /// Rank them after every scored unit, in unit order
    Last,
}

/// Ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Ordering policy
    pub policy: RankPolicy,
    /// Lower winsorizing quantile (default: 0.05)
    pub lower: f64,
    /// Upper winsorizing quantile (default: 0.95)
    pub upper: f64,
    /// Treatment of NaN scores
    pub nan_policy: NanPolicy,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            policy: RankPolicy::Normalized,
            lower: 0.05,
            upper: 0.95,
            nan_policy: NanPolicy::Exclude,
        }
    }
}

impl RankConfig {
    /// Default configuration with the given policy.
    pub fn with_policy(policy: RankPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Check `0 <= lower < upper <= 1`.
    pub fn validate(&self) -> Result<()> {
        let valid = (0.0..=1.0).contains(&self.lower)
            && (0.0..=1.0).contains(&self.upper)
            && self.lower < self.upper;
        if valid {
            Ok(())
        } else {
            Err(RankError::InvalidBand {
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

/// One selected unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUnit {
    /// 1-based position in the ranking
    pub position: usize,
    /// Unit index in the efficiency table
    pub index: usize,
    /// Unit key
    pub unit: String,
    /// Raw efficiency score
    pub efficiency: f64,
    /// Winsorized normal score (normalized policy only)
    pub normalized: Option<f64>,
}

/// The first `count` units of a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSubset {
    /// Policy used
    pub policy: RankPolicy,
    /// Selected units, best first
    pub units: Vec<RankedUnit>,
    /// Units dropped for lack of a score
    pub excluded: Vec<String>,
}

impl RankedSubset {
    /// Unit keys in ranked order.
    pub fn keys(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.unit.as_str()).collect()
    }

    /// Number of selected units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Rank the table under `config` and return the first `count` units.
///
/// The table is not modified. Sorting is stable: ties keep unit order.
pub fn select_top(table: &EfficiencyTable, count: usize, config: &RankConfig) -> Result<RankedSubset> {
    config.validate()?;

    let (scored, unscored): (Vec<&EfficiencyRow>, Vec<&EfficiencyRow>) =
        table.rows().iter().partition(|r| !r.efficiency.is_nan());

    let keys: Vec<f64> = match config.policy {
        RankPolicy::Raw => scored.iter().map(|r| r.efficiency).collect(),
        RankPolicy::Normalized => transformed(&scored, config)?,
    };

    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));

    let normalized = |i: usize| match config.policy {
        RankPolicy::Raw => None,
        RankPolicy::Normalized => Some(keys[i]),
    };

    let mut ranked: Vec<(&EfficiencyRow, Option<f64>)> =
        order.into_iter().map(|i| (scored[i], normalized(i))).collect();

    let excluded = match config.nan_policy {
        NanPolicy::Exclude => unscored.iter().map(|r| r.unit.clone()).collect(),
        NanPolicy::Last => {
            let nan = match config.policy {
                RankPolicy::Raw => None,
                RankPolicy::Normalized => Some(f64::NAN),
            };
            ranked.extend(unscored.iter().map(|r| (*r, nan)));
            Vec::new()
        }
    };

    if !excluded.is_empty() {
        tracing::debug!(excluded = excluded.len(), "units without a score excluded from ranking");
    }

    let units = ranked
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, (row, normalized))| RankedUnit {
            position: i + 1,
            index: row.index,
            unit: row.unit.clone(),
            efficiency: row.efficiency,
            normalized,
        })
        .collect();

    Ok(RankedSubset {
        policy: config.policy,
        units,
        excluded,
    })
}

/// Copy of the table with the winsorized normal score of every scored unit.
///
/// Units without a score get `None`.
pub fn normalized_scores(table: &EfficiencyTable, config: &RankConfig) -> Result<EfficiencyTable> {
    config.validate()?;

    let scored: Vec<&EfficiencyRow> = table
        .rows()
        .iter()
        .filter(|r| !r.efficiency.is_nan())
        .collect();
    let mut values = transformed(&scored, config)?.into_iter();

    let column: Vec<Option<f64>> = table
        .rows()
        .iter()
        .map(|r| {
            if r.efficiency.is_nan() {
                None
            } else {
                values.next()
            }
        })
        .collect();

    Ok(table.with_normalized(&column))
}

fn transformed(rows: &[&EfficiencyRow], config: &RankConfig) -> Result<Vec<f64>> {
    let scores: Vec<f64> = rows.iter().map(|r| r.efficiency).collect();
    let z = normal_scores(&scores)?;
    Ok(winsorize(&z, config.lower, config.upper))
}
