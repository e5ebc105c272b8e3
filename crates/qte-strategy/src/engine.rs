use crate::gate::StrategyGate;
use crate::strategy::Strategy;
use crate::types::StrategyEngineError;
use qte_domain::{Interval, KLine, Position, Signal, Symbol};
use std::collections::HashMap;

/// A signal together with the strategy instance that produced it.
#[derive(Debug)]
pub struct StrategySignal {
    pub strategy_id: String,
    pub signal: Signal,
}

/// Owns every registered [`Strategy`] instance and dispatches candle-close
/// events to the ones subscribed to the (symbol, interval) that just
/// closed.
#[derive(Default)]
pub struct StrategyEngine {
    strategies: Vec<Box<dyn Strategy>>,
    bar_counts: HashMap<String, u64>,
}

impl StrategyEngine {
    pub fn new() -> Self {
        StrategyEngine {
            strategies: Vec::new(),
            bar_counts: HashMap::new(),
        }
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) -> Result<(), StrategyEngineError> {
        let id = strategy.spec().strategy_id.clone();
        if self.strategies.iter().any(|s| s.spec().strategy_id == id) {
            return Err(StrategyEngineError::DuplicateStrategyId(id));
        }
        self.bar_counts.insert(id, 0);
        self.strategies.push(strategy);
        Ok(())
    }

    /// Dispatch one candle-close event. `open_positions` maps strategy id
    /// to the position that strategy currently owns, if any — for each
    /// tracked open position belonging to a strategy, `on_position_update`
    /// is also called.
    pub fn on_candle_close(
        &mut self,
        symbol: &Symbol,
        interval: Interval,
        window: &[KLine],
        open_positions: &HashMap<String, Position>,
        gate: &dyn StrategyGate,
    ) -> Vec<StrategySignal> {
        let mut out = Vec::new();
        let Some(last) = window.last() else {
            return out;
        };
        for strategy in &mut self.strategies {
            let (id, matches) = {
                let spec = strategy.spec();
                (
                    spec.strategy_id.clone(),
                    &spec.symbol == symbol && spec.interval == interval,
                )
            };
            if !matches {
                continue;
            }
            *self.bar_counts.entry(id.clone()).or_insert(0) += 1;

            if gate.is_strategy_enabled(&id) && strategy.cooldown_remaining() == 0 {
                if let Some(signal) = strategy.analyze(window) {
                    out.push(StrategySignal {
                        strategy_id: id.clone(),
                        signal,
                    });
                }
            }

            if let Some(position) = open_positions.get(&id) {
                if let Some(signal) = strategy.on_position_update(position, last) {
                    out.push(StrategySignal {
                        strategy_id: id.clone(),
                        signal,
                    });
                }
            }
        }
        out
    }

    /// Forward a trade-closed notification to the strategy that owned it,
    /// resetting its cooldown bookkeeping. Cooldown is counted in closed
    /// bars and reset by this call.
    pub fn record_trade(&mut self, strategy_id: &str) {
        if let Some(strategy) = self
            .strategies
            .iter_mut()
            .find(|s| s.spec().strategy_id == strategy_id)
        {
            strategy.record_trade();
        }
    }

    pub fn bar_count(&self, strategy_id: &str) -> u64 {
        self.bar_counts.get(strategy_id).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        for s in &mut self.strategies {
            s.reset();
        }
        self.bar_counts.clear();
    }
}
