#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod filter;
pub mod normalize;
pub mod statistics;
pub mod table;

pub use error::{DataError, Result};
pub use filter::{Clause, Comparator, FilterSet};
pub use normalize::{RawValue, parse_optional, parse_value};
pub use statistics::{StatisticRow, clean_attribute, read_statistics, read_statistics_file};
pub use table::{FeatureTable, MissingPolicy, metric_key};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
