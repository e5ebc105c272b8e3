use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;

fn write_candles(dir: &tempfile::TempDir, rows: &[(&str, &str, &str, &str, &str, &str)]) -> String {
    let path = dir.path().join("candles.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "open_time,close_time,open,high,low,close,volume,quote_volume,trades").unwrap();
    for (t0, t1, open, high, low, close) in rows {
        writeln!(f, "{t0},{t1},{open},{high},{low},{close},1,100,1").unwrap();
    }
    path.to_str().unwrap().to_string()
}

#[test]
fn backtest_runs_against_a_csv_candle_file_and_prints_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = Vec::new();
    let base = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap();
    let mut price = 100.0;
    for i in 0..40 {
        let t0 = (base + chrono::Duration::minutes(i)).to_rfc3339();
        let t1 = (base + chrono::Duration::minutes(i + 1)).to_rfc3339();
        price += if i % 3 == 0 { 1.0 } else { -0.2 };
        let close = format!("{price:.4}");
        rows.push((t0, t1, close.clone(), (price + 0.5).to_string(), (price - 0.5).to_string(), close));
    }
    let borrowed: Vec<(&str, &str, &str, &str, &str, &str)> =
        rows.iter().map(|(a, b, c, d, e, f)| (a.as_str(), b.as_str(), c.as_str(), d.as_str(), e.as_str(), f.as_str())).collect();
    let candles_path = write_candles(&dir, &borrowed);

    let mut cmd = assert_cmd::Command::cargo_bin("qte").unwrap();
    cmd.args([
        "run",
        "backtest",
        "--candles",
        &candles_path,
        "--symbol",
        "BTC-USDT",
        "--interval",
        "1m",
        "--fast",
        "3",
        "--slow",
        "8",
    ]);

    cmd.assert().success().stdout(predicate::str::contains("bars_loaded=40"));
}

#[test]
fn run_live_fails_closed_with_no_exchange_adapter() {
    let mut cmd = assert_cmd::Command::cargo_bin("qte").unwrap();
    cmd.args(["run", "live"]);
    cmd.assert().failure().stderr(predicate::str::contains("configured exchange adapter"));
}
