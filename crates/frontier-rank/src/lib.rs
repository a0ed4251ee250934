#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod select;
pub mod transform;

pub use select::{
    NanPolicy, RankConfig, RankPolicy, RankedSubset, RankedUnit, normalized_scores, select_top,
};
pub use transform::{average_ranks, normal_scores, percentile, winsorize};

use thiserror::Error;

/// Ranking errors
#[derive(Debug, Error)]
pub enum RankError {
    /// Percentile band outside `0 <= lower < upper <= 1`
    #[error("Invalid percentile band: ({lower}, {upper})")]
    InvalidBand {
        /// Lower quantile
        lower: f64,
        /// Upper quantile
        upper: f64,
    },

    /// The reference distribution could not be built
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Result type for ranking operations
pub type Result<T> = std::result::Result<T, RankError>;
