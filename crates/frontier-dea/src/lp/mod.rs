//! Linear programming
//!
//! A small dense LP layer sized for DEA: a few dozen variables and one
//! constraint per peer unit. Every variable is continuous and non-negative.
//!
//! ```text
//! maximise / minimise   c^T x
//! subject to            a_i^T x  (<= | = | >=)  b_i
//!                       x >= 0
//! ```

mod simplex;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Optimisation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    /// Maximise the objective
    Maximize,
    /// Minimise the objective
    Minimize,
}

/// Constraint relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// `a^T x <= b`
    LessEqual,
    /// `a^T x = b`
    Equal,
    /// `a^T x >= b`
    GreaterEqual,
}

/// Terminal state of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LpStatus {
    /// An optimal basic solution was found
    Optimal,
    /// No point satisfies the constraints
    Infeasible,
    /// The objective is unbounded over the feasible region
    Unbounded,
    /// The pivot limit was reached before a terminal state
    NotSolved,
}

impl LpStatus {
    /// Whether the solve reached optimality.
    pub const fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal)
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Infeasible => "Infeasible",
            Self::Unbounded => "Unbounded",
            Self::NotSolved => "Not Solved",
        }
    }
}

impl fmt::Display for LpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Handle to a variable of one [`LinearProgram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    /// Column index of the variable.
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// A named linear constraint over dense coefficients
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Constraint name
    pub name: String,
    /// One coefficient per variable
    pub coefficients: Vec<f64>,
    /// Relation to the right-hand side
    pub relation: Relation,
    /// Right-hand side
    pub rhs: f64,
}

/// Simplex solver options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Smallest magnitude accepted as a pivot element (default: 1e-9)
    pub pivot_tolerance: f64,
    /// Largest phase-one infeasibility treated as zero (default: 1e-7)
    pub feasibility_tolerance: f64,
    /// Pivot limit across both phases (default: 50_000)
    pub max_iterations: usize,
    /// Consecutive degenerate pivots before switching to Bland's rule (default: 50)
    pub degenerate_limit: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            max_iterations: 50_000,
            degenerate_limit: 50,
        }
    }
}

/// Result of solving a [`LinearProgram`]
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Terminal state
    pub status: LpStatus,
    /// Objective value (NaN unless optimal)
    pub objective: f64,
    /// Variable values in declaration order (NaN unless optimal)
    pub values: Vec<f64>,
}

impl LpSolution {
    pub(crate) fn failed(status: LpStatus, n_variables: usize) -> Self {
        Self {
            status,
            objective: f64::NAN,
            values: vec![f64::NAN; n_variables],
        }
    }
}

/// A linear program with non-negative continuous variables
///
/// Each program owns its variables; handles from one program are
/// meaningless in another.
#[derive(Debug, Clone)]
pub struct LinearProgram {
    name: String,
    sense: Sense,
    variables: Vec<String>,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

impl LinearProgram {
    /// Create an empty program.
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            sense,
            variables: Vec::new(),
            objective: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a non-negative variable.
    pub fn add_variable(&mut self, name: impl Into<String>) -> VarId {
        self.variables.push(name.into());
        self.objective.push(0.0);
        for constraint in &mut self.constraints {
            constraint.coefficients.push(0.0);
        }
        VarId(self.variables.len() - 1)
    }

    /// Set the objective as a sum of `coefficient * variable` terms.
    ///
    /// Repeated variables accumulate.
    pub fn set_objective(&mut self, terms: &[(VarId, f64)]) {
        self.objective = self.dense(terms);
    }

    /// Add a constraint `sum(terms) relation rhs`.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: &[(VarId, f64)],
        relation: Relation,
        rhs: f64,
    ) {
        let coefficients = self.dense(terms);
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            relation,
            rhs,
        });
    }

    fn dense(&self, terms: &[(VarId, f64)]) -> Vec<f64> {
        let mut row = vec![0.0; self.variables.len()];
        for (var, coefficient) in terms {
            row[var.0] += coefficient;
        }
        row
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optimisation direction.
    pub const fn sense(&self) -> Sense {
        self.sense
    }

    /// Variable names in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Objective coefficients in declaration order.
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Solve with the two-phase simplex method.
    pub fn solve(&self, options: &SolverOptions) -> LpSolution {
        simplex::solve(self, options)
    }
}
