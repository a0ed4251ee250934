//! End-to-end screen over a statistics CSV.

use frontier::data::read_statistics;
use frontier::dea::DeaConfig;
use frontier::output::{ExportFormat, Exporter};
use frontier::rank::{RankConfig, RankPolicy};
use frontier::{ScreenConfig, Screener};

const STATISTICS: &str = "\
ticker,attribute,value
AMD,Market Cap (intraday),245.3B
AMD,Trailing P/E,\"210.5\"
AMD,Price/Sales (ttm),10.8
AMD,Return on Equity (ttm),2.4%
AMD,Profit Margin,3.8%
INTC,Market Cap (intraday),92.5B
INTC,Trailing P/E,31.8
INTC,Price/Sales (ttm),1.7
INTC,Return on Equity (ttm),1.6%
INTC,Profit Margin,3.1%
NVDA,Market Cap (intraday),\"2,950B\"
NVDA,Trailing P/E,72.1
NVDA,Price/Sales (ttm),38.2
NVDA,Return on Equity (ttm),115.7%
NVDA,Profit Margin,48.8%
QCOM,Market Cap (intraday),185.0B
QCOM,Trailing P/E,23.0
QCOM,Price/Sales (ttm),5.2
QCOM,Return on Equity (ttm),39.9%
QCOM,Profit Margin,23.0%
TXN,Market Cap (intraday),180.6B
TXN,Trailing P/E,34.1
TXN,Price/Sales (ttm),10.9
TXN,Return on Equity (ttm),30.1%
TXN,Profit Margin,30.7%
MU,Market Cap (intraday),135.2B
MU,Trailing P/E,--
MU,Price/Sales (ttm),6.0
MU,Return on Equity (ttm),-5.1%
MU,Profit Margin,-5.3%
";

fn config(policy: RankPolicy) -> ScreenConfig {
    ScreenConfig {
        sector: "Semiconductors".to_string(),
        inputs: vec!["Trailing P/E".to_string(), "Price/Sales".to_string()],
        outputs: vec!["Return on Equity".to_string(), "Profit Margin".to_string()],
        count: 3,
        rank: RankConfig::with_policy(policy),
        dea: DeaConfig::default(),
        ..Default::default()
    }
}

#[test]
fn test_screen_from_csv() {
    let rows = read_statistics(STATISTICS.as_bytes()).unwrap();
    let report = Screener::new(config(RankPolicy::Raw))
        .unwrap()
        .run_statistics(&rows)
        .unwrap();

    assert_eq!(report.universe, 6);
    // MU has negative outputs and is dropped
    assert_eq!(report.evaluated, 5);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].ticker, "MU");

    assert_eq!(report.rows.len(), 3);
    // AMD pays the most valuation per unit of quality
    assert_eq!(report.rows[0].ticker, "AMD");
    for pair in report.rows.windows(2) {
        assert!(pair[0].efficiency <= pair[1].efficiency);
    }
    for row in &report.rows {
        assert!(row.efficiency > 0.0 && row.efficiency <= 1.0 + 1e-6);
        assert!(row.market_cap_billions.is_some());
    }

    assert_eq!(report.weights.len(), 5);
    assert_eq!(report.optimal(), 5);
}

#[test]
fn test_screen_normalized_policy() {
    let rows = read_statistics(STATISTICS.as_bytes()).unwrap();
    let raw = Screener::new(config(RankPolicy::Raw))
        .unwrap()
        .run_statistics(&rows)
        .unwrap();
    let normalized = Screener::new(config(RankPolicy::Normalized))
        .unwrap()
        .run_statistics(&rows)
        .unwrap();

    assert_eq!(normalized.rows.len(), 3);
    assert!(normalized.rows.iter().all(|r| r.normalized.is_some()));
    // Both policies agree on the cheapest ticker
    assert_eq!(normalized.rows[0].ticker, raw.rows[0].ticker);
}

#[test]
fn test_screen_filter_and_export() {
    let rows = read_statistics(STATISTICS.as_bytes()).unwrap();
    let config = ScreenConfig {
        filter: "Profit Margin > 10% and Trailing P/E < 100".to_string(),
        ..config(RankPolicy::Raw)
    };
    let report = Screener::new(config).unwrap().run_statistics(&rows).unwrap();

    assert_eq!(report.evaluated, 3);
    let mut tickers = report.tickers();
    tickers.sort_unstable();
    assert_eq!(tickers, vec!["NVDA", "QCOM", "TXN"]);

    let csv = report.rows.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 4);
}
