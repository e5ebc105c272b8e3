//! CSV candle loader for `qte run backtest`.
//!
//! Columns (header required): `open_time,close_time,open,high,low,close,
//! volume,quote_volume,trades`, one row per closed candle in ascending
//! time order. `symbol`/`interval` are supplied once on the command line
//! rather than repeated per row, since a backtest run is single-symbol
//!.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use qte_domain::{Interval, KLine, Price, Qty, Symbol};
use std::path::Path;

#[derive(serde::Deserialize)]
struct Row {
    open_time: DateTime<Utc>,
    close_time: DateTime<Utc>,
    open: rust_decimal::Decimal,
    high: rust_decimal::Decimal,
    low: rust_decimal::Decimal,
    close: rust_decimal::Decimal,
    volume: rust_decimal::Decimal,
    quote_volume: rust_decimal::Decimal,
    trades: u64,
}

pub fn load_candles_csv(path: &Path, symbol: &Symbol, interval: Interval) -> Result<Vec<KLine>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("open candles csv: {}", path.display()))?;
    let mut out = Vec::new();
    for (i, row) in reader.deserialize::<Row>().enumerate() {
        let row = row.with_context(|| format!("parse candle row {i} in {}", path.display()))?;
        let kline = KLine::new(
            symbol.clone(),
            interval,
            row.open_time,
            row.close_time,
            Price::new(row.open),
            Price::new(row.high),
            Price::new(row.low),
            Price::new(row.close),
            Qty::new(row.volume),
            Price::new(row.quote_volume),
            row.trades,
            true,
        )
        .with_context(|| format!("candle row {i} violates KLine invariants"))?;
        out.push(kline);
    }
    Ok(out)
}
