#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod lp;
pub mod matrix;
pub mod model;
pub mod solution;

// Re-export main types
pub use error::DeaError;
pub use lp::{LinearProgram, LpSolution, LpStatus, Relation, Sense, SolverOptions, VarId};
pub use matrix::MetricMatrix;
pub use model::{DeaConfig, DeaModel, UnitProgram, unit_program};
pub use solution::{DeaSolution, EfficiencyRow, EfficiencyTable, UnitResult, WeightRecord};
