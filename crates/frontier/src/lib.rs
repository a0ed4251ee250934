#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod screen;

// Re-export main types from sub-crates
pub use frontier_data as data;
pub use frontier_dea as dea;
pub use frontier_output as output;
pub use frontier_rank as rank;

pub use screen::{MARKET_CAP_METRIC, NegativePolicy, ScreenConfig, ScreenError, Screener};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
