//! A small SMA-crossover strategy shipped so `qte run backtest` has
//! something to run against out of the box. Strategies are user-supplied
//! in this system; this is demo wiring only, not a strategy
//! plugin loader.

use qte_domain::{KLine, Position, Price, Qty, Signal, SignalType};
use qte_indicators::sma;
use qte_strategy::{Strategy, StrategySpec};
use rust_decimal::Decimal;

pub struct SmaCrossoverDemo {
    spec: StrategySpec,
    fast_n: usize,
    slow_n: usize,
    stop_loss_fraction: Decimal,
    in_position: bool,
}

impl SmaCrossoverDemo {
    pub fn new(spec: StrategySpec, fast_n: usize, slow_n: usize, stop_loss_fraction: Decimal) -> Self {
        SmaCrossoverDemo { spec, fast_n, slow_n, stop_loss_fraction, in_position: false }
    }
}

impl Strategy for SmaCrossoverDemo {
    fn spec(&self) -> &StrategySpec {
        &self.spec
    }

    fn analyze(&mut self, candles: &[KLine]) -> Option<Signal> {
        if candles.len() < self.slow_n + 1 {
            return None;
        }
        let closes: Vec<Price> = candles.iter().map(|c| c.close).collect();
        let fast = sma(&closes, self.fast_n).ok()?;
        let slow = sma(&closes, self.slow_n).ok()?;
        let (fast_prev, fast_now) = (*fast.get(fast.len().checked_sub(2)?)?, *fast.last()?);
        let (slow_prev, slow_now) = (*slow.get(slow.len().checked_sub(2)?)?, *slow.last()?);

        let last = candles.last()?;
        let golden_cross = fast_prev <= slow_prev && fast_now > slow_now;
        let death_cross = fast_prev >= slow_prev && fast_now < slow_now;

        if !self.in_position && golden_cross {
            self.in_position = true;
            let stop = Price::new(last.close.raw() * (Decimal::ONE - self.stop_loss_fraction));
            return Some(Signal {
                strategy_id: self.spec.strategy_id.clone(),
                symbol: self.spec.symbol.clone(),
                signal_type: SignalType::EntryLong,
                suggested_price: last.close,
                suggested_quantity: Qty::ZERO,
                stop_loss: stop,
                take_profit: None,
                reason: "sma_golden_cross".to_string(),
            });
        }
        if self.in_position && death_cross {
            self.in_position = false;
            return Some(Signal {
                strategy_id: self.spec.strategy_id.clone(),
                symbol: self.spec.symbol.clone(),
                signal_type: SignalType::ExitLong,
                suggested_price: last.close,
                suggested_quantity: Qty::ZERO,
                stop_loss: Price::ZERO,
                take_profit: None,
                reason: "sma_death_cross".to_string(),
            });
        }
        None
    }

    fn on_position_update(&mut self, _position: &Position, _candle: &KLine) -> Option<Signal> {
        None
    }

    fn record_trade(&mut self) {}

    fn reset(&mut self) {
        self.in_position = false;
    }
}
