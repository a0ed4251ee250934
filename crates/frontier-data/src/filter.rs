//! Typed filter predicates.
//!
//! A [`FilterSet`] is a conjunction of `metric comparator threshold` clauses
//! evaluated against a [`FeatureTable`](crate::table::FeatureTable). It is
//! the hand-off point from the external tree-fitting step: the split rules
//! of the best-performing leaf become clauses here.
//!
//! The textual form joins clauses with `and`:
//!
//! ```text
//! Return on Assets < 42.81 and Diluted EPS > 8.345
//! ```

use crate::error::{DataError, Result};
use crate::normalize::parse_value;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl Comparator {
    /// Operator symbol.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// Apply the comparison to a pair of values.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
        }
    }

    fn apply(&self, column: Expr, threshold: f64) -> Expr {
        let threshold = lit(threshold);
        match self {
            Self::Lt => column.lt(threshold),
            Self::Le => column.lt_eq(threshold),
            Self::Gt => column.gt(threshold),
            Self::Ge => column.gt_eq(threshold),
            Self::Eq => column.eq(threshold),
            Self::Ne => column.neq(threshold),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "==" | "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            other => Err(DataError::InvalidFilter {
                expression: other.to_string(),
                reason: "unknown comparator".to_string(),
            }),
        }
    }
}

/// A single `metric comparator threshold` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Metric column name
    pub metric: String,
    /// Comparison operator
    pub comparator: Comparator,
    /// Right-hand side
    pub threshold: f64,
}

impl Clause {
    /// Create a new clause.
    pub fn new(metric: impl Into<String>, comparator: Comparator, threshold: f64) -> Self {
        Self {
            metric: metric.into(),
            comparator,
            threshold,
        }
    }

    /// Polars expression for this clause.
    pub fn to_expr(&self) -> Expr {
        self.comparator
            .apply(col(self.metric.as_str()), self.threshold)
    }

    /// Evaluate against a single value.
    pub fn matches(&self, value: f64) -> bool {
        self.comparator.compare(value, self.threshold)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.metric, self.comparator, self.threshold)
    }
}

impl FromStr for Clause {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| DataError::InvalidFilter {
            expression: s.to_string(),
            reason: reason.to_string(),
        };

        let start = s
            .find(['<', '>', '=', '!'])
            .ok_or_else(|| invalid("no comparator"))?;
        let end = if s[start + 1..].starts_with('=') {
            start + 2
        } else {
            start + 1
        };

        let metric = s[..start].trim();
        if metric.is_empty() {
            return Err(invalid("missing metric name"));
        }

        let comparator: Comparator = s[start..end].parse()?;
        let threshold =
            parse_value(s[end..].trim()).map_err(|_| invalid("threshold is not a number"))?;

        Ok(Self::new(metric, comparator, threshold))
    }
}

/// Conjunction of clauses. Empty sets keep every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    clauses: Vec<Clause>,
}

impl FilterSet {
    /// Create a filter from clauses.
    pub const fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    /// Add a clause.
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Clauses in evaluation order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Combined polars predicate, `None` when there are no clauses.
    pub fn to_expr(&self) -> Option<Expr> {
        self.clauses
            .iter()
            .map(Clause::to_expr)
            .reduce(|acc, expr| acc.and(expr))
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

impl FromStr for FilterSet {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        let clauses = split_conjunction(s)
            .into_iter()
            .map(str::parse::<Clause>)
            .collect::<Result<Vec<Clause>>>()?;

        Ok(Self::new(clauses))
    }
}

/// Split on ` and ` (any case) or `&&`.
fn split_conjunction(s: &str) -> Vec<&str> {
    let lower = s.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < s.len() {
        let sep = if lower[i..].starts_with(" and ") {
            5
        } else if lower[i..].starts_with("&&") {
            2
        } else {
            0
        };

        if sep > 0 {
            parts.push(s[start..i].trim());
            i += sep;
            start = i;
        } else {
            i += lower[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    parts.push(s[start..].trim());
    parts
}
