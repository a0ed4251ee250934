//! Key-statistics ingestion.
//!
//! A scraper (outside this workspace) dumps each ticker's statistics page as
//! attribute/value pairs. The interchange format is a long CSV table:
//!
//! ```text
//! ticker,attribute,value
//! AAPL,Market Cap (intraday),2.95T
//! AAPL,Trailing P/E,31.2
//! AAPL,Return on Equity (ttm),147.25%
//! ```
//!
//! Values stay raw strings here; [`crate::normalize`] converts them when the
//! feature table is built.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One scraped attribute for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticRow {
    /// Ticker symbol
    pub ticker: String,
    /// Attribute label as displayed on the statistics page
    pub attribute: String,
    /// Raw display value
    pub value: String,
}

impl StatisticRow {
    /// Create a new statistic row.
    pub fn new(
        ticker: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute label with parenthesised qualifiers removed.
    pub fn metric(&self) -> String {
        clean_attribute(&self.attribute)
    }
}

/// Read statistic rows from any CSV source with a `ticker,attribute,value` header.
pub fn read_statistics<R: Read>(reader: R) -> Result<Vec<StatisticRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }

    tracing::debug!(rows = rows.len(), "read statistics");
    Ok(rows)
}

/// Read statistic rows from a CSV file.
pub fn read_statistics_file(path: impl AsRef<Path>) -> Result<Vec<StatisticRow>> {
    let file = File::open(path.as_ref())?;
    read_statistics(file)
}

/// Strip innermost parenthesised groups and surrounding whitespace.
///
/// `"Return on Equity (ttm)"` becomes `"Return on Equity"` and
/// `"Market Cap (intraday)"` becomes `"Market Cap"`. Only groups that contain
/// no other parenthesis are removed, in a single pass.
pub fn clean_attribute(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        match after.find(['(', ')']) {
            Some(i) if after[i..].starts_with(')') => {
                out.push_str(&rest[..open]);
                rest = &after[i + 1..];
            }
            // Nested group: keep this '(' and resume at the inner one.
            Some(i) => {
                out.push_str(&rest[..open + 1 + i]);
                rest = &after[i..];
            }
            None => break,
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Return on Equity (ttm)", "Return on Equity")]
    #[case("Market Cap (intraday)", "Market Cap")]
    #[case("Trailing P/E", "Trailing P/E")]
    #[case("  Diluted EPS (ttm) ", "Diluted EPS")]
    #[case("PEG Ratio (5 yr expected)", "PEG Ratio")]
    #[case("Shares Short (prior month (Jun 2024))", "Shares Short (prior month )")]
    #[case("Unclosed (group", "Unclosed (group")]
    fn test_clean_attribute(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_attribute(raw), expected);
    }

    #[test]
    fn test_read_statistics() {
        let csv = "ticker,attribute,value\n\
                   AAPL,Market Cap (intraday),2.95T\n\
                   AAPL,\"Enterprise Value/EBITDA\",22.41\n\
                   MSFT,Trailing P/E, 36.5 \n";

        let rows = read_statistics(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].metric(), "Market Cap");
        assert_eq!(rows[1].attribute, "Enterprise Value/EBITDA");
        assert_eq!(rows[2], StatisticRow::new("MSFT", "Trailing P/E", "36.5"));
    }

    #[test]
    fn test_read_statistics_missing_column() {
        let csv = "ticker,attribute\nAAPL,Beta\n";
        assert!(read_statistics(csv.as_bytes()).is_err());
    }
}
