//! Export of screen results.
//!
//! Ranked rows export as one CSV record per ticker. DEA weights are
//! flattened to one record per ticker, side and metric. JSON export of a
//! [`ScreenReport`] carries the whole report.

use crate::report::{ScreenReport, ScreenRow};
use frontier_dea::WeightRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension (`.csv` or `.json`).
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(path.display().to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One solved DEA weight, flattened for CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightExport {
    /// Ticker symbol.
    pub ticker: String,

    /// `input` or `output`.
    pub side: String,

    /// Metric name.
    pub metric: String,

    /// Solved weight, empty when the program was not optimal.
    pub weight: Option<f64>,
}

impl WeightExport {
    /// Flatten per-ticker weight records, in ticker then metric order.
    pub fn flatten(weights: &BTreeMap<String, WeightRecord>) -> Vec<Self> {
        let mut records = Vec::new();
        for (ticker, record) in weights {
            for (side, map) in [("input", &record.inputs), ("output", &record.outputs)] {
                for (metric, weight) in map {
                    records.push(Self {
                        ticker: ticker.clone(),
                        side: side.to_string(),
                        metric: metric.clone(),
                        weight: weight.is_finite().then_some(*weight),
                    });
                }
            }
        }
        records
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<'a, T, I>(records: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for Vec<ScreenRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<WeightExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for ScreenReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Header information as comments
                output.push_str(&format!("# Sector: {}\n", self.sector));
                output.push_str(&format!("# Generated: {}\n", self.generated_at.to_rfc3339()));
                output.push_str(&format!("# Policy: {}\n", self.policy));
                if let Some(filter) = &self.filter {
                    output.push_str(&format!("# Filter: {filter}\n"));
                }

                output.push_str(&csv_string(&self.rows)?);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rows() -> Vec<ScreenRow> {
        vec![
            ScreenRow {
                rank: 1,
                ticker: "INTC".to_string(),
                efficiency: 0.41,
                normalized: Some(-1.64),
                market_cap_billions: Some(92.5),
            },
            ScreenRow {
                rank: 2,
                ticker: "HPQ".to_string(),
                efficiency: 0.57,
                normalized: Some(-0.84),
                market_cap_billions: None,
            },
        ]
    }

    fn weights() -> BTreeMap<String, WeightRecord> {
        let mut solved = WeightRecord::default();
        solved.inputs.insert("Trailing P/E".to_string(), 0.032);
        solved.outputs.insert("Return on Equity".to_string(), 0.0041);

        let mut unsolved = WeightRecord::default();
        unsolved.inputs.insert("Trailing P/E".to_string(), f64::NAN);

        let mut weights = BTreeMap::new();
        weights.insert("INTC".to_string(), solved);
        weights.insert("ZZZ".to_string(), unsolved);
        weights
    }

    #[test]
    fn test_rows_export_csv() {
        let csv = rows().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "rank,ticker,efficiency,normalized,market_cap_billions"
        );
        assert_eq!(lines.next().unwrap(), "1,INTC,0.41,-1.64,92.5");
        assert_eq!(lines.next().unwrap(), "2,HPQ,0.57,-0.84,");
    }

    #[test]
    fn test_rows_export_json() {
        let json = rows().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"INTC\""));
        assert!(json.contains("\"market_cap_billions\":null"));
    }

    #[test]
    fn test_weights_flatten() {
        let records = WeightExport::flatten(&weights());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].side, "input");
        assert_eq!(records[1].metric, "Return on Equity");
        assert_eq!(records[2].weight, None);

        let csv = records.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("ticker,side,metric,weight\n"));
        assert!(csv.contains("ZZZ,input,Trailing P/E,\n"));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_from_str(#[case] text: &str, #[case] expected: ExportFormat) {
        assert_eq!(text.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/screen.csv")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("screen.JSON")).unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(ExportFormat::from_path(Path::new("screen.xlsx")).is_err());
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
