#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/frontier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod render;
pub mod report;

pub use export::{ExportError, ExportFormat, Exporter, WeightExport};
pub use report::{ExcludedUnit, ReportBuilder, ReportError, ScreenReport, ScreenRow};
