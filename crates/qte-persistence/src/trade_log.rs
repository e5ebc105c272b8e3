//! Append-only CSV backtest trade log.
//!
//! Columns: `entry_time, exit_time, strategy_id, symbol, side, entry_price,
//! exit_price, quantity, pnl, fee, net_pnl, atr_pct, rsi, ema20, ema200,
//! exit_reason`. The indicator columns are a best-effort snapshot taken at
//! exit time by the caller (the backtest engine), not recomputed here.

use qte_domain::ClosedTrade;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

/// Indicator readings at the moment a trade closed, for post-hoc analysis.
/// Any field the caller didn't have on hand (e.g. a strategy that doesn't
/// use RSI) is left `None` and serializes as an empty CSV cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct TradeLogIndicators {
    pub atr_pct: Option<Decimal>,
    pub rsi: Option<Decimal>,
    pub ema20: Option<Decimal>,
    pub ema200: Option<Decimal>,
}

#[derive(Serialize)]
struct TradeLogRow {
    entry_time: String,
    exit_time: String,
    strategy_id: String,
    symbol: String,
    side: String,
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
    pnl: Decimal,
    fee: Decimal,
    net_pnl: Decimal,
    atr_pct: Option<Decimal>,
    rsi: Option<Decimal>,
    ema20: Option<Decimal>,
    ema200: Option<Decimal>,
    exit_reason: String,
}

/// Appends rows to a CSV file, writing the header once on first creation.
pub struct TradeLogWriter {
    path: std::path::PathBuf,
}

impl TradeLogWriter {
    pub fn new(path: impl Into<std::path::PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(TradeLogWriter { path })
    }

    pub fn append(&self, trade: &ClosedTrade, indicators: TradeLogIndicators) -> Result<(), csv::Error> {
        let write_header = !self.path.exists();
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(write_header).from_writer(file);

        writer.serialize(TradeLogRow {
            entry_time: trade.entry_time.to_rfc3339(),
            exit_time: trade.exit_time.to_rfc3339(),
            strategy_id: trade.strategy_id.clone(),
            symbol: trade.symbol.pair_string(),
            side: format!("{:?}", trade.side),
            entry_price: trade.entry_price.raw(),
            exit_price: trade.exit_price.raw(),
            quantity: trade.quantity.raw(),
            pnl: trade.gross_pnl.raw(),
            fee: trade.fee.raw(),
            net_pnl: trade.net_pnl().raw(),
            atr_pct: indicators.atr_pct,
            rsi: indicators.rsi,
            ema20: indicators.ema20,
            ema200: indicators.ema200,
            exit_reason: format!("{:?}", trade.exit_reason),
        })?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{ExitReason, Price, PositionSide, Qty, Symbol};
    use rust_decimal_macros::dec;

    fn trade() -> ClosedTrade {
        let t = chrono::Utc::now();
        ClosedTrade::new(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Price::new(dec!(110)),
            Qty::new(dec!(1)),
            Price::new(dec!(10)),
            Price::new(dec!(1)),
            t,
            t,
            "strat-1".into(),
            ExitReason::StrategyExit,
        )
    }

    #[test]
    fn header_is_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("trades.csv");
        let writer = TradeLogWriter::new(&path).unwrap();
        writer.append(&trade(), TradeLogIndicators::default()).unwrap();
        writer.append(&trade(), TradeLogIndicators::default()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header_count = contents.lines().filter(|l| l.starts_with("entry_time")).count();
        assert_eq!(header_count, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn missing_indicators_serialize_as_empty_cells() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("trades.csv");
        let writer = TradeLogWriter::new(&path).unwrap();
        writer.append(&trade(), TradeLogIndicators::default()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert!(data_line.contains(",,,,StrategyExit"));
    }
}
