//! Frontier CLI binary.
//!
//! Screens a sector's key statistics with Data Envelopment Analysis and
//! prints the ranked tickers.

mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use frontier::output::{ExportFormat, Exporter, ScreenReport, WeightExport};
use frontier::rank::RankPolicy;
use frontier::{ScreenConfig, Screener};
use frontier_data::{parse_value, read_statistics_file};
use indicatif::{ProgressBar, ProgressStyle};
use logging::LogFormat;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "frontier")]
#[command(about = "Frontier: sector screening by Data Envelopment Analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a DEA screen over a statistics CSV
    Screen {
        /// Statistics CSV with a ticker,attribute,value header
        #[arg(long)]
        stats: PathBuf,

        /// JSON screen configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sector label for the report
        #[arg(long)]
        sector: Option<String>,

        /// Filter, e.g. "Return on Assets < 42.81 and Diluted EPS > 8.345"
        #[arg(long)]
        filter: Option<String>,

        /// Number of tickers to report
        #[arg(long)]
        count: Option<usize>,

        /// Ranking policy (raw or normalized)
        #[arg(long)]
        policy: Option<RankPolicy>,

        /// Solve programs on one thread
        #[arg(long)]
        sequential: bool,

        /// Report format on stdout
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Write the ranked rows to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format (csv, json, pretty-json); inferred from the extension
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Write the solved DEA weights to this file
        #[arg(long)]
        weights: Option<PathBuf>,
    },

    /// Parse display values such as 2.95T or 26.31%
    Parse {
        /// Values to parse
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// List the metrics found in a statistics CSV
    Metrics {
        /// Statistics CSV with a ticker,attribute,value header
        #[arg(long)]
        stats: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Screen {
            stats,
            config,
            sector,
            filter,
            count,
            policy,
            sequential,
            output,
            export,
            format,
            weights,
        } => {
            let mut config = match config {
                Some(path) => ScreenConfig::from_json_file(path)?,
                None => ScreenConfig::default(),
            };
            if let Some(sector) = sector {
                config.sector = sector;
            }
            if let Some(filter) = filter {
                config.filter = filter;
            }
            if let Some(count) = count {
                config.count = count;
            }
            if let Some(policy) = policy {
                config.rank.policy = policy;
            }
            if sequential {
                config.dea.parallel = false;
            }

            let report = screen(&stats, config)?;
            print_report(&report, output)?;

            if let Some(path) = export {
                let format = resolve_format(&path, format)?;
                report.rows.export_to_file(&path, format)?;
                eprintln!("Wrote {} rows to {}", report.rows.len(), path.display());
            }
            if let Some(path) = weights {
                let format = resolve_format(&path, format)?;
                let records = WeightExport::flatten(&report.weights);
                records.export_to_file(&path, format)?;
                eprintln!("Wrote {} weights to {}", records.len(), path.display());
            }
        }
        Commands::Parse { values } => {
            for value in values {
                match parse_value(value.as_str()) {
                    Ok(number) => println!("{:<16} {}", value, number),
                    Err(e) => println!("{:<16} {}", value, e),
                }
            }
        }
        Commands::Metrics { stats } => list_metrics(&stats)?,
    }

    Ok(())
}

fn screen(stats: &Path, config: ScreenConfig) -> Result<ScreenReport, Box<dyn std::error::Error>> {
    let rows = read_statistics_file(stats)?;
    let screener = Screener::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Screening {} statistic rows...", rows.len()));

    match screener.run_statistics(&rows) {
        Ok(report) => {
            pb.finish_with_message(format!(
                "Screened {} of {} tickers",
                report.evaluated, report.universe
            ));
            Ok(report)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn print_report(report: &ScreenReport, output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Text => print!("{}", report.to_ascii_table()),
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn resolve_format(
    path: &Path,
    format: Option<ExportFormat>,
) -> Result<ExportFormat, Box<dyn std::error::Error>> {
    match format {
        Some(format) => Ok(format),
        None => Ok(ExportFormat::from_path(path)?),
    }
}

fn list_metrics(stats: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_statistics_file(stats)?;

    let mut tickers: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for row in &rows {
        let entry = tickers.entry(row.metric()).or_default();
        if !entry.contains(&row.ticker.as_str()) {
            entry.push(&row.ticker);
        }
    }

    println!("{:<40} {:>8}", "Metric", "Tickers");
    println!("{}", "-".repeat(49));
    for (metric, seen) in &tickers {
        println!("{:<40} {:>8}", metric, seen.len());
    }
    println!(
        "\n{}",
        serde_json::json!({ "rows": rows.len(), "metrics": tickers.len() })
    );
    Ok(())
}
