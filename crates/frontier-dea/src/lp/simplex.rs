//! Two-phase dense tableau simplex
//!
//! Tableau layout, `(m + 1) x (cols + 1)`:
//! - rows `0..m` are constraints, row `m` holds reduced costs `z_j - c_j`
//! - columns are structural | slack/surplus | artificial | rhs
//!
//! Phase one maximises `-sum(artificials)`; a negative optimum means the
//! program is infeasible. Artificials still basic at zero are pivoted out,
//! or their rows dropped as redundant, before phase two optimises the real
//! objective with artificial columns barred from entering.
//!
//! Pricing is Dantzig's most-negative reduced cost. After
//! `degenerate_limit` consecutive degenerate pivots the solver switches to
//! Bland's rule, which cannot cycle. DEA programs are heavily degenerate
//! (every peer constraint has a zero right-hand side), so this matters.

use super::{LinearProgram, LpSolution, LpStatus, Relation, Sense, SolverOptions};
use ndarray::{Array2, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

#[derive(Debug)]
struct Tableau<'a> {
    t: Array2<f64>,
    basis: Vec<usize>,
    n_structural: usize,
    artificial_start: usize,
    options: &'a SolverOptions,
    iterations: usize,
    degenerate_run: usize,
    bland: bool,
}

pub(super) fn solve(lp: &LinearProgram, options: &SolverOptions) -> LpSolution {
    let n = lp.variables.len();
    let mut tableau = Tableau::build(lp, options);

    if tableau.has_artificials() {
        match tableau.phase_one() {
            Ok(()) => {}
            Err(status) => return LpSolution::failed(status, n),
        }
    }

    // Maximise internally; a minimisation negates the costs.
    let costs: Vec<f64> = match lp.sense {
        Sense::Maximize => lp.objective.clone(),
        Sense::Minimize => lp.objective.iter().map(|c| -c).collect(),
    };
    tableau.load_objective(&costs);

    match tableau.iterate(tableau.artificial_start) {
        Outcome::Optimal => {}
        Outcome::Unbounded => return LpSolution::failed(LpStatus::Unbounded, n),
        Outcome::IterationLimit => return LpSolution::failed(LpStatus::NotSolved, n),
    }

    let value = tableau.objective_value();
    let objective = match lp.sense {
        Sense::Maximize => value,
        Sense::Minimize => -value,
    };

    LpSolution {
        status: LpStatus::Optimal,
        objective,
        values: tableau.structural_values(),
    }
}

impl<'a> Tableau<'a> {
    fn build(lp: &LinearProgram, options: &'a SolverOptions) -> Self {
        let n = lp.variables.len();
        let m = lp.constraints.len();

        // Normalise to non-negative right-hand sides.
        let rows: Vec<(Vec<f64>, Relation, f64)> = lp
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let flipped = match c.relation {
                        Relation::LessEqual => Relation::GreaterEqual,
                        Relation::GreaterEqual => Relation::LessEqual,
                        Relation::Equal => Relation::Equal,
                    };
                    (c.coefficients.iter().map(|a| -a).collect(), flipped, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.relation, c.rhs)
                }
            })
            .collect();

        let n_slack = rows
            .iter()
            .filter(|(_, r, _)| *r != Relation::Equal)
            .count();
        let n_artificial = rows
            .iter()
            .filter(|(_, r, _)| *r != Relation::LessEqual)
            .count();

        let artificial_start = n + n_slack;
        let cols = artificial_start + n_artificial;
        let rhs = cols;

        let mut t = Array2::<f64>::zeros((m + 1, cols + 1));
        let mut basis = vec![0; m];
        let mut slack = n;
        let mut artificial = artificial_start;

        for (i, (coefficients, relation, b)) in rows.iter().enumerate() {
            for (j, a) in coefficients.iter().enumerate() {
                t[[i, j]] = *a;
            }
            t[[i, rhs]] = *b;

            match relation {
                Relation::LessEqual => {
                    t[[i, slack]] = 1.0;
                    basis[i] = slack;
                    slack += 1;
                }
                Relation::GreaterEqual => {
                    t[[i, slack]] = -1.0;
                    slack += 1;
                    t[[i, artificial]] = 1.0;
                    basis[i] = artificial;
                    artificial += 1;
                }
                Relation::Equal => {
                    t[[i, artificial]] = 1.0;
                    basis[i] = artificial;
                    artificial += 1;
                }
            }
        }

        Self {
            t,
            basis,
            n_structural: n,
            artificial_start,
            options,
            iterations: 0,
            degenerate_run: 0,
            bland: false,
        }
    }

    fn rows(&self) -> usize {
        self.t.nrows() - 1
    }

    fn rhs(&self) -> usize {
        self.t.ncols() - 1
    }

    fn has_artificials(&self) -> bool {
        self.artificial_start < self.rhs()
    }

    fn objective_value(&self) -> f64 {
        self.t[[self.rows(), self.rhs()]]
    }

    fn phase_one(&mut self) -> Result<(), LpStatus> {
        let m = self.rows();
        let rhs = self.rhs();

        // Reduced costs for max -sum(a): +1 on artificials, then price out
        // the artificial basis.
        self.t.row_mut(m).fill(0.0);
        for j in self.artificial_start..rhs {
            self.t[[m, j]] = 1.0;
        }
        for i in 0..m {
            if self.basis[i] >= self.artificial_start {
                let row = self.t.row(i).to_owned();
                self.t.row_mut(m).scaled_add(-1.0, &row);
            }
        }

        match self.iterate(rhs) {
            Outcome::Optimal => {}
            Outcome::Unbounded | Outcome::IterationLimit => return Err(LpStatus::NotSolved),
        }

        if self.objective_value() < -self.options.feasibility_tolerance {
            return Err(LpStatus::Infeasible);
        }

        self.drive_out_artificials();
        Ok(())
    }

    /// Pivot zero-valued artificials out of the basis, dropping rows that
    /// have no structural or slack entry left.
    fn drive_out_artificials(&mut self) {
        let m = self.rows();
        let mut keep: Vec<usize> = Vec::with_capacity(m + 1);

        for i in 0..m {
            if self.basis[i] < self.artificial_start {
                keep.push(i);
                continue;
            }

            let entering = (0..self.artificial_start)
                .find(|&j| self.t[[i, j]].abs() > self.options.pivot_tolerance);

            match entering {
                Some(j) => {
                    self.pivot(i, j);
                    keep.push(i);
                }
                None => {
                    tracing::trace!(row = i, "dropping redundant constraint row");
                }
            }
        }

        if keep.len() < m {
            keep.push(m);
            self.t = self.t.select(Axis(0), &keep);
            self.basis = keep[..keep.len() - 1]
                .iter()
                .map(|&i| self.basis[i])
                .collect();
        }
    }

    fn load_objective(&mut self, costs: &[f64]) {
        let m = self.rows();

        self.t.row_mut(m).fill(0.0);
        for (j, c) in costs.iter().enumerate() {
            self.t[[m, j]] = -c;
        }
        for i in 0..m {
            let b = self.basis[i];
            if b < self.n_structural && costs[b] != 0.0 {
                let row = self.t.row(i).to_owned();
                self.t.row_mut(m).scaled_add(costs[b], &row);
            }
        }
    }

    /// Run simplex pivots; only columns `< allowed` may enter.
    fn iterate(&mut self, allowed: usize) -> Outcome {
        loop {
            let Some(entering) = self.entering_column(allowed) else {
                return Outcome::Optimal;
            };
            let Some(leaving) = self.leaving_row(entering) else {
                return Outcome::Unbounded;
            };

            if self.iterations >= self.options.max_iterations {
                return Outcome::IterationLimit;
            }
            self.iterations += 1;

            if self.t[[leaving, self.rhs()]] <= self.options.pivot_tolerance {
                self.degenerate_run += 1;
                if !self.bland && self.degenerate_run > self.options.degenerate_limit {
                    tracing::trace!(
                        iterations = self.iterations,
                        "switching to Bland's rule after degenerate pivots"
                    );
                    self.bland = true;
                }
            } else {
                self.degenerate_run = 0;
            }

            self.pivot(leaving, entering);
        }
    }

    fn entering_column(&self, allowed: usize) -> Option<usize> {
        let m = self.rows();
        let tol = self.options.pivot_tolerance;
        let reduced = self.t.row(m);

        if self.bland {
            return (0..allowed).find(|&j| reduced[j] < -tol);
        }

        let mut best: Option<(usize, f64)> = None;
        for j in 0..allowed {
            let d = reduced[j];
            if d < -tol && best.is_none_or(|(_, b)| d < b) {
                best = Some((j, d));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Minimum ratio test; ties go to the smallest basic column index.
    fn leaving_row(&self, entering: usize) -> Option<usize> {
        let rhs = self.rhs();
        let tol = self.options.pivot_tolerance;
        let mut best: Option<(usize, f64)> = None;

        for i in 0..self.rows() {
            let a = self.t[[i, entering]];
            if a <= tol {
                continue;
            }
            let ratio = self.t[[i, rhs]].max(0.0) / a;
            best = match best {
                None => Some((i, ratio)),
                Some((r, best_ratio)) => {
                    if ratio < best_ratio - tol
                        || (ratio <= best_ratio + tol && self.basis[i] < self.basis[r])
                    {
                        Some((i, ratio))
                    } else {
                        Some((r, best_ratio))
                    }
                }
            };
        }
        best.map(|(i, _)| i)
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let p = self.t[[row, col]];
        let pivot_row = self.t.row(row).to_owned() / p;
        self.t.row_mut(row).assign(&pivot_row);

        for i in 0..self.t.nrows() {
            if i == row {
                continue;
            }
            let factor = self.t[[i, col]];
            if factor != 0.0 {
                self.t.row_mut(i).scaled_add(-factor, &pivot_row);
                self.t[[i, col]] = 0.0;
            }
        }

        self.basis[row] = col;
    }

    fn structural_values(&self) -> Vec<f64> {
        let rhs = self.rhs();
        let mut values = vec![0.0; self.n_structural];
        for (i, &b) in self.basis.iter().enumerate() {
            if b < self.n_structural {
                // Clamp round-off below the bound.
                values[b] = self.t[[i, rhs]].max(0.0);
            }
        }
        values
    }
}
