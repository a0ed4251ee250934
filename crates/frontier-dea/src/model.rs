//! Efficiency model
//!
//! CCR output-maximisation DEA. For a target unit `j0` with input weights
//! `v` and output weights `u`:
//!
//! ```text
//! maximise    sum_k u_k * y[j0, k]
//! subject to  sum_j v_j * x[j0, j] = 1
//!             sum_k u_k * y[i, k] - sum_j v_j * x[i, j] <= 0   for every unit i
//!             u, v >= 0
//! ```
//!
//! where `x` is the inputs matrix and `y` the outputs matrix. The optimum is
//! the unit's efficiency score in `[0, 1]`; units on the frontier score 1.

use crate::error::DeaError;
use crate::lp::{LinearProgram, Relation, Sense, SolverOptions, VarId};
use crate::matrix::MetricMatrix;
use crate::solution::{DeaSolution, UnitResult, WeightRecord};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// DEA configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeaConfig {
    /// Solve units across the rayon pool (default: true)
    pub parallel: bool,
    /// Slack allowed above a score of 1 before it is reported (default: 1e-6)
    pub tolerance: f64,
    /// Simplex pivot limit per unit (default: 50_000)
    pub max_iterations: usize,
}

impl Default for DeaConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            tolerance: 1e-6,
            max_iterations: 50_000,
        }
    }
}

impl DeaConfig {
    fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            max_iterations: self.max_iterations,
            ..Default::default()
        }
    }
}

/// The linear program of one unit together with its weight variables
#[derive(Debug, Clone)]
pub struct UnitProgram {
    /// Target unit index
    pub unit: usize,
    /// The program
    pub program: LinearProgram,
    /// Input weight variables, in input column order
    pub input_vars: Vec<VarId>,
    /// Output weight variables, in output column order
    pub output_vars: Vec<VarId>,
}

/// DEA model over fixed inputs and outputs
#[derive(Debug, Clone)]
pub struct DeaModel {
    inputs: MetricMatrix,
    outputs: MetricMatrix,
    programs: Vec<UnitProgram>,
    config: DeaConfig,
}

impl DeaModel {
    /// Build the model and one program per unit.
    ///
    /// # Errors
    /// - [`DeaError::DimensionMismatch`] if the matrices have different unit counts
    /// - [`DeaError::UnitMismatch`] if unit keys differ at any row
    /// - [`DeaError::EmptyMetrics`] if there are units but no input or output columns
    pub fn new(
        inputs: MetricMatrix,
        outputs: MetricMatrix,
        config: DeaConfig,
    ) -> Result<Self, DeaError> {
        if inputs.n_units() != outputs.n_units() {
            return Err(DeaError::DimensionMismatch(format!(
                "inputs have {} units, outputs have {}",
                inputs.n_units(),
                outputs.n_units()
            )));
        }

        for (index, (input, output)) in inputs.units().iter().zip(outputs.units()).enumerate() {
            if input != output {
                return Err(DeaError::UnitMismatch {
                    index,
                    input: input.clone(),
                    output: output.clone(),
                });
            }
        }

        if inputs.n_units() > 0 {
            if inputs.n_metrics() == 0 {
                return Err(DeaError::EmptyMetrics("input"));
            }
            if outputs.n_metrics() == 0 {
                return Err(DeaError::EmptyMetrics("output"));
            }
        }

        let programs = (0..inputs.n_units())
            .map(|j0| unit_program(&inputs, &outputs, j0))
            .collect();

        tracing::debug!(
            units = inputs.n_units(),
            inputs = inputs.n_metrics(),
            outputs = outputs.n_metrics(),
            "built DEA model"
        );

        Ok(Self {
            inputs,
            outputs,
            programs,
            config,
        })
    }

    /// Build a model from bare arrays; units are keyed by row position.
    pub fn from_arrays(
        inputs: Array2<f64>,
        outputs: Array2<f64>,
        config: DeaConfig,
    ) -> Result<Self, DeaError> {
        if inputs.nrows() != outputs.nrows() {
            return Err(DeaError::DimensionMismatch(format!(
                "inputs have {} units, outputs have {}",
                inputs.nrows(),
                outputs.nrows()
            )));
        }

        let input_names = (0..inputs.ncols()).map(|j| format!("input_{j}")).collect();
        let output_names = (0..outputs.ncols()).map(|k| format!("output_{k}")).collect();

        Self::new(
            MetricMatrix::from_array(input_names, inputs)?,
            MetricMatrix::from_array(output_names, outputs)?,
            config,
        )
    }

    /// Inputs matrix.
    pub const fn inputs(&self) -> &MetricMatrix {
        &self.inputs
    }

    /// Outputs matrix.
    pub const fn outputs(&self) -> &MetricMatrix {
        &self.outputs
    }

    /// Model configuration.
    pub const fn config(&self) -> &DeaConfig {
        &self.config
    }

    /// Number of units.
    pub fn n_units(&self) -> usize {
        self.inputs.n_units()
    }

    /// Program of one unit.
    pub fn program(&self, unit: usize) -> Option<&UnitProgram> {
        self.programs.get(unit)
    }

    /// Solve a single unit's program.
    pub fn solve_unit(&self, unit: usize) -> Result<UnitResult, DeaError> {
        let program = self.programs.get(unit).ok_or(DeaError::UnitOutOfRange {
            index: unit,
            units: self.n_units(),
        })?;
        Ok(self.solve_program(program))
    }

    /// Solve every unit's program.
    ///
    /// Results are in unit order regardless of the order in which the
    /// programs complete. Non-optimal programs are recorded, not raised.
    pub fn solve(&self) -> DeaSolution {
        let results: Vec<UnitResult> = if self.config.parallel {
            self.programs
                .par_iter()
                .map(|program| self.solve_program(program))
                .collect()
        } else {
            self.programs
                .iter()
                .map(|program| self.solve_program(program))
                .collect()
        };

        let solution = DeaSolution::new(results);
        tracing::info!(
            units = solution.len(),
            statuses = ?solution.status_counts(),
            "solved DEA batch"
        );
        solution
    }

    fn solve_program(&self, program: &UnitProgram) -> UnitResult {
        let lp = program.program.solve(&self.config.solver_options());
        let key = &self.inputs.units()[program.unit];

        if !lp.status.is_optimal() {
            tracing::warn!(unit = %key, status = %lp.status, "unit program not optimal");
        } else if lp.objective > 1.0 + self.config.tolerance {
            tracing::warn!(unit = %key, efficiency = lp.objective, "efficiency above one");
        } else {
            tracing::debug!(unit = %key, efficiency = lp.objective, "solved unit");
        }

        let weights = WeightRecord {
            inputs: self
                .inputs
                .metrics()
                .iter()
                .zip(&program.input_vars)
                .map(|(name, var)| (name.clone(), lp.values[var.index()]))
                .collect(),
            outputs: self
                .outputs
                .metrics()
                .iter()
                .zip(&program.output_vars)
                .map(|(name, var)| (name.clone(), lp.values[var.index()]))
                .collect(),
        };

        UnitResult {
            index: program.unit,
            unit: key.clone(),
            status: lp.status,
            efficiency: lp.objective,
            weights,
        }
    }
}

/// Build the program for target unit `j0` with its own variable set.
pub fn unit_program(inputs: &MetricMatrix, outputs: &MetricMatrix, j0: usize) -> UnitProgram {
    let mut program = LinearProgram::new(format!("dea[{}]", inputs.units()[j0]), Sense::Maximize);

    let output_vars: Vec<VarId> = outputs
        .metrics()
        .iter()
        .map(|name| program.add_variable(format!("output_weight[{name}]")))
        .collect();
    let input_vars: Vec<VarId> = inputs
        .metrics()
        .iter()
        .map(|name| program.add_variable(format!("input_weight[{name}]")))
        .collect();

    program.set_objective(&weighted(&output_vars, outputs.row(j0), 1.0));
    program.add_constraint(
        "normalisation",
        &weighted(&input_vars, inputs.row(j0), 1.0),
        Relation::Equal,
        1.0,
    );

    for (j1, peer) in inputs.units().iter().enumerate() {
        let mut terms = weighted(&output_vars, outputs.row(j1), 1.0);
        terms.extend(weighted(&input_vars, inputs.row(j1), -1.0));
        program.add_constraint(format!("peer[{peer}]"), &terms, Relation::LessEqual, 0.0);
    }

    UnitProgram {
        unit: j0,
        program,
        input_vars,
        output_vars,
    }
}

fn weighted(vars: &[VarId], row: ArrayView1<'_, f64>, sign: f64) -> Vec<(VarId, f64)> {
    vars.iter()
        .zip(row.iter())
        .map(|(var, value)| (*var, sign * value))
        .collect()
}
