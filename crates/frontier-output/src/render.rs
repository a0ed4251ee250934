//! Terminal and Markdown rendering of screen reports.

use crate::report::ScreenReport;
use std::fmt;

const WIDTH: usize = 72;

fn optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => "-".to_string(),
    }
}

fn score(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        "NaN".to_string()
    }
}

impl ScreenReport {
    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nSector Screen: {}\n", self.sector));
        output.push_str(&format!(
            "Generated: {}  Policy: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.policy
        ));
        if let Some(filter) = &self.filter {
            output.push_str(&format!("Filter: {filter}\n"));
        }
        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        output.push_str(&format!(
            "  Universe: {}  Evaluated: {}  Optimal: {}  Excluded: {}\n",
            self.universe,
            self.evaluated,
            self.optimal(),
            self.excluded.len()
        ));
        let statuses: Vec<String> = self
            .status_counts
            .iter()
            .map(|(status, count)| format!("{status}={count}"))
            .collect();
        if !statuses.is_empty() {
            output.push_str(&format!("  Statuses: {}\n", statuses.join(", ")));
        }

        output.push('\n');
        output.push_str(&format!(
            "{:>4}  {:<10} {:>12} {:>12} {:>16}\n",
            "Rank", "Ticker", "Efficiency", "Normalized", "Mkt Cap ($B)"
        ));
        output.push_str(&"-".repeat(WIDTH));
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("  (no tickers selected)\n");
        }
        for row in &self.rows {
            output.push_str(&format!(
                "{:>4}  {:<10} {:>12} {:>12} {:>16}\n",
                row.rank,
                row.ticker,
                score(row.efficiency),
                optional(row.normalized, 4),
                optional(row.market_cap_billions, 2)
            ));
        }

        if !self.excluded.is_empty() {
            output.push_str("\nExcluded:\n");
            for unit in &self.excluded {
                output.push_str(&format!("  {:<10} {}\n", unit.ticker, unit.reason));
            }
        }

        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Sector Screen: {}\n\n", self.sector));
        output.push_str(&format!(
            "**Generated:** {}  \n**Policy:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.policy
        ));
        if let Some(filter) = &self.filter {
            output.push_str(&format!("**Filter:** `{filter}`\n\n"));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!("- **Universe:** {}\n", self.universe));
        output.push_str(&format!("- **Evaluated:** {}\n", self.evaluated));
        for (status, count) in &self.status_counts {
            output.push_str(&format!("- **{status}:** {count}\n"));
        }
        output.push_str(&format!("- **Excluded:** {}\n\n", self.excluded.len()));

        output.push_str("## Ranking\n\n");
        output.push_str("| Rank | Ticker | Efficiency | Normalized | Mkt Cap ($B) |\n");
        output.push_str("|------|--------|------------|------------|--------------|\n");
        for row in &self.rows {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.rank,
                row.ticker,
                score(row.efficiency),
                optional(row.normalized, 4),
                optional(row.market_cap_billions, 2)
            ));
        }

        if !self.excluded.is_empty() {
            output.push_str("\n## Excluded\n\n");
            for unit in &self.excluded {
                output.push_str(&format!("- `{}`: {}\n", unit.ticker, unit.reason));
            }
        }

        output
    }
}

impl fmt::Display for ScreenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sector Screen: {} ({} of {} evaluated, {} policy)",
            self.sector, self.evaluated, self.universe, self.policy
        )?;
        for row in &self.rows {
            writeln!(f, "  {:>3}. {} {}", row.rank, row.ticker, score(row.efficiency))?;
        }
        Ok(())
    }
}
