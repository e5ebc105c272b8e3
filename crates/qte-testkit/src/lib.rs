//! Scenario-wiring helpers shared by the `tests/scenario_*.rs` files. Not
//! a production dependency of anything — this crate exists purely to
//! exercise the stack end to end against a handful of concrete trading
//! scenarios.

use chrono::{DateTime, Utc};
use qte_domain::{Interval, KLine, Price, Qty, Signal, Symbol};
use qte_strategy::{Strategy, StrategySpec};

/// A strategy whose signal per closed candle is fixed in advance, indexed
/// by the window length (i.e. `script[i]` fires when `analyze` is called
/// with `i + 1` candles). Lets a scenario assert on an exact, spec-given
/// sequence of entries/exits instead of deriving one from an indicator.
pub struct ScriptedStrategy {
    spec: StrategySpec,
    script: Vec<Option<Signal>>,
}

impl ScriptedStrategy {
    pub fn new(strategy_id: impl Into<String>, symbol: Symbol, interval: Interval, script: Vec<Option<Signal>>) -> Self {
        ScriptedStrategy { spec: StrategySpec::new(strategy_id, symbol, interval), script }
    }
}

impl Strategy for ScriptedStrategy {
    fn spec(&self) -> &StrategySpec {
        &self.spec
    }

    fn analyze(&mut self, candles: &[KLine]) -> Option<Signal> {
        self.script.get(candles.len() - 1).and_then(|s| s.clone())
    }
}

pub fn btc_usdt() -> Symbol {
    Symbol::parse("BTC-USDT").unwrap()
}

pub fn one_minute() -> Interval {
    Interval::parse("1m").unwrap()
}

/// Build a closed 1-minute candle at `minute_index` with the given OHLC,
/// body-consistent by construction (`open`/`close` between `low`/`high`).
pub fn candle(symbol: &Symbol, interval: Interval, minute_index: i64, open: &str, high: &str, low: &str, close: &str) -> KLine {
    let base: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
    let open_time = base + chrono::Duration::minutes(minute_index);
    let close_time = open_time + chrono::Duration::minutes(1);
    KLine::new(
        symbol.clone(),
        interval,
        open_time,
        close_time,
        Price::new(open.parse().unwrap()),
        Price::new(high.parse().unwrap()),
        Price::new(low.parse().unwrap()),
        Price::new(close.parse().unwrap()),
        Qty::new("1".parse().unwrap()),
        Price::new("100".parse().unwrap()),
        1,
        true,
    )
    .unwrap()
}
