//! Ties [`RollingEvCalculator`] and the [`HealthState`] machine together
//! into the one object the Strategy Engine consults before calling
//! `analyze`.

use crate::calculator::RollingEvCalculator;
use crate::state::{transition, HealthConfig, HealthState};
use qte_domain::ClosedTrade;
use qte_strategy::StrategyGate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Persisted per-strategy state.
/// Trades are stored oldest-first; restoring from this must reproduce the
/// same [`crate::calculator::RollingEvSnapshot`] as the live run that wrote it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedStrategyHealth {
    pub strategy_id: String,
    pub state: HealthState,
    pub trades: Vec<ClosedTrade>,
}

/// Owns the rolling EV calculator and per-strategy [`HealthState`], guarded
/// by a single mutex held only for the span of one trade recording or
/// snapshot.
pub struct HealthSupervisor {
    config: HealthConfig,
    inner: Mutex<Inner>,
}

struct Inner {
    calculator: RollingEvCalculator,
    states: HashMap<String, HealthState>,
}

impl HealthSupervisor {
    pub fn new(window_size: usize, config: HealthConfig) -> Self {
        HealthSupervisor {
            config,
            inner: Mutex::new(Inner { calculator: RollingEvCalculator::new(window_size), states: HashMap::new() }),
        }
    }

    /// Record a newly closed trade and re-evaluate the owning strategy's
    /// health state. Returns the state after the transition.
    pub fn record_closed_trade(&self, strategy_id: &str, trade: ClosedTrade) -> HealthState {
        let mut inner = self.inner.lock().expect("health supervisor mutex poisoned");
        inner.calculator.record_trade(strategy_id, trade);
        let snapshot = inner.calculator.snapshot(strategy_id);
        let current = inner.states.get(strategy_id).copied().unwrap_or(HealthState::Enabled);
        let next = transition(current, &snapshot, &self.config);
        if next != current {
            info!(strategy_id, ?current, ?next, sample_size = snapshot.sample_size, "strategy health transition");
        }
        inner.states.insert(strategy_id.to_string(), next);
        next
    }

    /// Consulted by the Strategy Engine before calling `analyze` on a
    /// strategy. A strategy never evaluated yet defaults to `ENABLED`.
    pub fn is_strategy_enabled(&self, strategy_id: &str) -> bool {
        let inner = self.inner.lock().expect("health supervisor mutex poisoned");
        inner.states.get(strategy_id).copied().unwrap_or(HealthState::Enabled).is_enabled()
    }

    pub fn state(&self, strategy_id: &str) -> HealthState {
        let inner = self.inner.lock().expect("health supervisor mutex poisoned");
        inner.states.get(strategy_id).copied().unwrap_or(HealthState::Enabled)
    }

    /// The only path from DISABLED back to ENABLED when `auto_enable` is
    /// off: an explicit operator action, never an automatic transition.
    pub fn enable_strategy(&self, strategy_id: &str) {
        let mut inner = self.inner.lock().expect("health supervisor mutex poisoned");
        inner.states.insert(strategy_id.to_string(), HealthState::Enabled);
    }

    /// Snapshot every tracked strategy's state for persistence.
    pub fn persisted_state(&self) -> Vec<PersistedStrategyHealth> {
        let inner = self.inner.lock().expect("health supervisor mutex poisoned");
        inner
            .states
            .keys()
            .map(|strategy_id| PersistedStrategyHealth {
                strategy_id: strategy_id.clone(),
                state: inner.states.get(strategy_id).copied().unwrap_or(HealthState::Enabled),
                trades: inner.calculator.trades(strategy_id),
            })
            .collect()
    }

    /// Reload state written by [`Self::persisted_state`] (or a richer
    /// caller-assembled record carrying each strategy's trade window).
    pub fn restore(&self, records: Vec<PersistedStrategyHealth>) {
        let mut inner = self.inner.lock().expect("health supervisor mutex poisoned");
        for record in records {
            inner.calculator.restore_state(&record.strategy_id, record.trades);
            inner.states.insert(record.strategy_id, record.state);
        }
    }
}

impl StrategyGate for HealthSupervisor {
    fn is_strategy_enabled(&self, strategy_id: &str) -> bool {
        HealthSupervisor::is_strategy_enabled(self, strategy_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{ExitReason, Price, PositionSide, Qty, Symbol};
    use rust_decimal_macros::dec;

    fn loss_trade() -> ClosedTrade {
        let t = chrono::Utc::now();
        ClosedTrade::new(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Price::new(dec!(90)),
            Qty::new(dec!(1)),
            Price::new(dec!(0)),
            Price::new(dec!(10)),
            t,
            t,
            "strat-1".into(),
            ExitReason::StopLoss,
        )
    }

    #[test]
    fn new_strategy_starts_enabled() {
        let sup = HealthSupervisor::new(10, HealthConfig::conservative_default());
        assert!(sup.is_strategy_enabled("strat-1"));
    }

    #[test]
    fn consecutive_losses_disable_and_persist_across_restore() {
        let sup = HealthSupervisor::new(10, HealthConfig::conservative_default());
        let mut last = HealthState::Enabled;
        for _ in 0..5 {
            last = sup.record_closed_trade("strat-1", loss_trade());
        }
        assert_eq!(last, HealthState::Disabled);
        assert!(!sup.is_strategy_enabled("strat-1"));
    }

    #[test]
    fn explicit_enable_overrides_disabled_state() {
        let sup = HealthSupervisor::new(10, HealthConfig::conservative_default());
        for _ in 0..5 {
            sup.record_closed_trade("strat-1", loss_trade());
        }
        assert!(!sup.is_strategy_enabled("strat-1"));
        sup.enable_strategy("strat-1");
        assert!(sup.is_strategy_enabled("strat-1"));
    }
}
