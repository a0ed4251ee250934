//! DEA results
//!
//! A [`DeaSolution`] holds one [`UnitResult`] per unit, in unit order, and
//! exposes three views over them: statuses, weight records, and the
//! efficiency table consumed by the ranking layer.

use crate::lp::LpStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Solved weights of one unit's program, keyed by metric name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Input weights (v)
    pub inputs: BTreeMap<String, f64>,
    /// Output weights (u)
    pub outputs: BTreeMap<String, f64>,
}

impl WeightRecord {
    /// Whether every weight is NaN (program not solved to optimality).
    pub fn is_unsolved(&self) -> bool {
        self.inputs
            .values()
            .chain(self.outputs.values())
            .all(|w| w.is_nan())
    }
}

/// Outcome of one unit's program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    /// Unit index (row in the metric matrices)
    pub index: usize,
    /// Unit key
    pub unit: String,
    /// Solver status
    pub status: LpStatus,
    /// Efficiency score, NaN unless optimal
    pub efficiency: f64,
    /// Solved weights, NaN unless optimal
    pub weights: WeightRecord,
}

/// Results of a full DEA batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeaSolution {
    results: Vec<UnitResult>,
}

impl DeaSolution {
    /// Wrap per-unit results, ordered by unit index.
    pub fn new(mut results: Vec<UnitResult>) -> Self {
        results.sort_by_key(|r| r.index);
        Self { results }
    }

    /// Per-unit results in unit order.
    pub fn results(&self) -> &[UnitResult] {
        &self.results
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no unit was evaluated.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Unit key to solver status.
    pub fn statuses(&self) -> BTreeMap<String, LpStatus> {
        self.results
            .iter()
            .map(|r| (r.unit.clone(), r.status))
            .collect()
    }

    /// Unit key to solved weights.
    pub fn weights(&self) -> BTreeMap<String, WeightRecord> {
        self.results
            .iter()
            .map(|r| (r.unit.clone(), r.weights.clone()))
            .collect()
    }

    /// Efficiency table in unit order.
    pub fn efficiency(&self) -> EfficiencyTable {
        EfficiencyTable::new(
            self.results
                .iter()
                .map(|r| EfficiencyRow {
                    index: r.index,
                    unit: r.unit.clone(),
                    status: r.status,
                    efficiency: r.efficiency,
                    normalized: None,
                })
                .collect(),
        )
    }

    /// Number of units per status.
    pub fn status_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.status.label().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// One row of the efficiency table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRow {
    /// Unit index
    pub index: usize,
    /// Unit key
    pub unit: String,
    /// Solver status
    pub status: LpStatus,
    /// Efficiency score, NaN unless optimal
    pub efficiency: f64,
    /// Normal-score transform of the efficiency, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
}

/// Efficiency scores for every unit, in unit order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTable {
    rows: Vec<EfficiencyRow>,
}

impl EfficiencyTable {
    /// Create a table from rows.
    pub const fn new(rows: Vec<EfficiencyRow>) -> Self {
        Self { rows }
    }

    /// Build an all-optimal table from raw scores, keyed by position.
    pub fn from_scores(scores: &[f64]) -> Self {
        Self::new(
            scores
                .iter()
                .enumerate()
                .map(|(index, &efficiency)| EfficiencyRow {
                    index,
                    unit: index.to_string(),
                    status: if efficiency.is_nan() {
                        LpStatus::NotSolved
                    } else {
                        LpStatus::Optimal
                    },
                    efficiency,
                    normalized: None,
                })
                .collect(),
        )
    }

    /// Rows in unit order.
    pub fn rows(&self) -> &[EfficiencyRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a unit key.
    pub fn get(&self, unit: &str) -> Option<&EfficiencyRow> {
        self.rows.iter().find(|r| r.unit == unit)
    }

    /// Efficiency scores in unit order.
    pub fn scores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.efficiency).collect()
    }

    /// Copy of the table with the normalized column replaced.
    ///
    /// `normalized` must have one entry per row; missing trailing entries
    /// leave the column empty.
    pub fn with_normalized(&self, normalized: &[Option<f64>]) -> Self {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| EfficiencyRow {
                normalized: normalized.get(i).copied().flatten(),
                ..row.clone()
            })
            .collect();
        Self::new(rows)
    }
}
