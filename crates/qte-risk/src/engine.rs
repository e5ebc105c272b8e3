use crate::types::{AccountState, ApprovedOrder, AsFraction, ReasonCode, RiskConfig, RiskState, RiskVerdict};
use qte_domain::{Percent, Position, Price, Qty, Signal, SignalType};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// The risk gate: validates, sizes, and may veto every signal. Never
/// panics and never returns an error to the caller — every rejection is a
/// [`RiskVerdict::Vetoed`] with a [`ReasonCode`], logged at the call site.
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        RiskEngine { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Run the ordered validation pipeline. `tracked_positions`
    /// is keyed by `Symbol::pair_string()`, matching the tracked-position
    /// map the execution engine owns.
    pub fn evaluate(
        &self,
        signal: &Signal,
        state: &RiskState,
        account: &AccountState,
        tracked_positions: &HashMap<String, Position>,
    ) -> RiskVerdict {
        let verdict = self.evaluate_inner(signal, state, account, tracked_positions);
        match &verdict {
            RiskVerdict::Vetoed(reason) => {
                debug!(
                    strategy_id = %signal.strategy_id,
                    symbol = %signal.symbol,
                    reason = reason.code(),
                    "risk gate vetoed signal"
                );
            }
            RiskVerdict::Approved(_) => {
                debug!(strategy_id = %signal.strategy_id, symbol = %signal.symbol, "risk gate approved signal");
            }
        }
        verdict
    }

    fn evaluate_inner(
        &self,
        signal: &Signal,
        state: &RiskState,
        account: &AccountState,
        tracked_positions: &HashMap<String, Position>,
    ) -> RiskVerdict {
        let is_entry = signal.signal_type.is_entry();

        // 1. Emergency-stop flag: veto all entries, exits still proceed.
        if state.emergency_stopped && is_entry {
            return RiskVerdict::Vetoed(ReasonCode::EmergencyStopped);
        }

        // 2. Consecutive-loss gate (entries only).
        if is_entry && state.consecutive_losses >= self.config.max_consecutive_losses {
            return RiskVerdict::Vetoed(ReasonCode::ConsecutiveLossLimitReached);
        }

        // 3. Drawdown gate (entries only; caller must flip emergency-stop).
        if is_entry {
            let drawdown = state.drawdown_fraction(account.equity);
            if drawdown >= self.config.max_drawdown_percent.fraction() {
                return RiskVerdict::Vetoed(ReasonCode::DrawdownLimitBreached);
            }
        }

        if is_entry {
            self.evaluate_entry(signal, account)
        } else {
            self.evaluate_exit(signal, tracked_positions)
        }
    }

    fn evaluate_entry(&self, signal: &Signal, account: &AccountState) -> RiskVerdict {
        let entry = signal.suggested_price;
        let stop = signal.stop_loss;

        // 4. Stop-loss presence, on the protective side of entry.
        if stop.is_zero() || !stop.is_positive() {
            return RiskVerdict::Vetoed(ReasonCode::StopLossMissing);
        }
        let protective_side_ok = match signal.signal_type {
            SignalType::EntryLong => stop < entry,
            SignalType::EntryShort => stop > entry,
            _ => unreachable!("evaluate_entry only called for entry signals"),
        };
        if !protective_side_ok {
            return RiskVerdict::Vetoed(ReasonCode::StopLossWrongSide);
        }

        // 5. Stop-loss distance.
        let stop_distance = (entry - stop).abs();
        let distance_fraction = stop_distance.raw() / entry.raw();
        if distance_fraction > self.config.max_stop_loss_percent.fraction() {
            return RiskVerdict::Vetoed(ReasonCode::StopDistanceExceeded);
        }

        // 6. Position sizing.
        let risk_amount = account.equity.raw() * self.config.risk_per_trade.fraction();
        let per_unit_risk = stop_distance.raw();
        let qty_by_risk = if per_unit_risk.is_zero() {
            Decimal::ZERO
        } else {
            risk_amount / per_unit_risk
        };

        let leverage_dec = Decimal::from(self.config.leverage);
        let qty_by_notional = (account.equity.raw()
            * self.config.max_position_ratio.fraction()
            * leverage_dec)
            / entry.raw();

        let qty_by_available = (account.available_balance.raw()
            * Decimal::new(95, 2)
            * leverage_dec)
            / (entry.raw() * self.config.margin_buffer);

        let mut candidate = qty_by_risk.min(qty_by_notional).min(qty_by_available);
        if signal.suggested_quantity.is_positive() {
            candidate = candidate.min(signal.suggested_quantity.raw());
        }

        let quantity = Qty::new(candidate);
        if !quantity.is_positive() {
            return RiskVerdict::Vetoed(ReasonCode::PositionSizeNonPositive);
        }

        RiskVerdict::Approved(ApprovedOrder {
            quantity,
            price: entry,
            stop_loss: stop,
            take_profit: signal.take_profit,
            reduce_only: false,
        })
    }

    fn evaluate_exit(&self, signal: &Signal, tracked_positions: &HashMap<String, Position>) -> RiskVerdict {
        // 7. Exit handling: resolve quantity from the tracked position when
        // the signal does not specify one; an exit with nothing tracked is
        // vetoed.
        let Some(position) = tracked_positions.get(&signal.symbol.pair_string()) else {
            return RiskVerdict::Vetoed(ReasonCode::ExitWithoutTrackedPosition);
        };
        let quantity = if signal.suggested_quantity.is_positive() {
            signal.suggested_quantity
        } else {
            position.quantity
        };
        if !quantity.is_positive() {
            return RiskVerdict::Vetoed(ReasonCode::PositionSizeNonPositive);
        }
        RiskVerdict::Approved(ApprovedOrder {
            quantity,
            price: signal.suggested_price,
            stop_loss: Price::ZERO,
            take_profit: None,
            reduce_only: true,
        })
    }
}

/// Percent helper re-exported for callers that only need the fraction
/// conversion without importing `AsFraction` themselves.
pub fn percent_fraction(p: Percent) -> Decimal {
    p.fraction()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{PositionSide, Symbol};
    use rust_decimal_macros::dec;

    fn account(equity: &str, available: &str) -> AccountState {
        AccountState {
            equity: Price::new(equity.parse().unwrap()),
            available_balance: Price::new(available.parse().unwrap()),
            unrealized_pnl: Price::ZERO,
        }
    }

    fn entry_signal(entry: &str, stop: &str) -> Signal {
        Signal {
            strategy_id: "s1".into(),
            symbol: Symbol::parse("BTC-USDT").unwrap(),
            signal_type: SignalType::EntryLong,
            suggested_price: Price::new(entry.parse().unwrap()),
            suggested_quantity: Qty::ZERO,
            stop_loss: Price::new(stop.parse().unwrap()),
            take_profit: None,
            reason: "test".into(),
        }
    }

    #[test]
    fn emergency_stop_vetoes_entries_not_exits() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let mut state = RiskState::new(Price::new(dec!(10000)));
        state.emergency_stop();
        let account = account("10000", "10000");
        let verdict = engine.evaluate(&entry_signal("100", "95"), &state, &account, &HashMap::new());
        assert_eq!(verdict, RiskVerdict::Vetoed(ReasonCode::EmergencyStopped));
    }

    #[test]
    fn stop_too_wide_is_vetoed_with_stop_distance_exceeded() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let state = RiskState::new(Price::new(dec!(10000)));
        let account = account("10000", "10000");
        // max_stop_loss_percent default is 5%; 20% distance should veto.
        let verdict = engine.evaluate(&entry_signal("100", "80"), &state, &account, &HashMap::new());
        assert_eq!(verdict, RiskVerdict::Vetoed(ReasonCode::StopDistanceExceeded));
    }

    #[test]
    fn wrong_side_stop_is_vetoed() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let state = RiskState::new(Price::new(dec!(10000)));
        let account = account("10000", "10000");
        // LONG entry with a stop above entry is on the wrong side.
        let verdict = engine.evaluate(&entry_signal("100", "110"), &state, &account, &HashMap::new());
        assert_eq!(verdict, RiskVerdict::Vetoed(ReasonCode::StopLossWrongSide));
    }

    #[test]
    fn well_formed_entry_is_approved_with_positive_quantity() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let state = RiskState::new(Price::new(dec!(10000)));
        let account = account("10000", "10000");
        let verdict = engine.evaluate(&entry_signal("100", "95"), &state, &account, &HashMap::new());
        match verdict {
            RiskVerdict::Approved(order) => assert!(order.quantity.is_positive()),
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn consecutive_loss_limit_vetoes_entries() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let mut state = RiskState::new(Price::new(dec!(10000)));
        state.consecutive_losses = 3;
        let account = account("10000", "10000");
        let verdict = engine.evaluate(&entry_signal("100", "95"), &state, &account, &HashMap::new());
        assert_eq!(
            verdict,
            RiskVerdict::Vetoed(ReasonCode::ConsecutiveLossLimitReached)
        );
    }

    #[test]
    fn exit_with_no_tracked_position_is_vetoed() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let state = RiskState::new(Price::new(dec!(10000)));
        let account = account("10000", "10000");
        let signal = Signal {
            strategy_id: "s1".into(),
            symbol: Symbol::parse("BTC-USDT").unwrap(),
            signal_type: SignalType::ExitLong,
            suggested_price: Price::new(dec!(105)),
            suggested_quantity: Qty::ZERO,
            stop_loss: Price::ZERO,
            take_profit: None,
            reason: "exit".into(),
        };
        let verdict = engine.evaluate(&signal, &state, &account, &HashMap::new());
        assert_eq!(verdict, RiskVerdict::Vetoed(ReasonCode::ExitWithoutTrackedPosition));
    }

    #[test]
    fn exit_with_zero_quantity_resolves_from_tracked_position() {
        let engine = RiskEngine::new(RiskConfig::conservative_defaults());
        let state = RiskState::new(Price::new(dec!(10000)));
        let account = account("10000", "10000");
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let position = Position::open(
            symbol.clone(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Qty::new(dec!(1.5)),
            Price::new(dec!(95)),
            chrono::Utc::now(),
            1,
        )
        .unwrap();
        let mut positions = HashMap::new();
        positions.insert(symbol.pair_string(), position);

        let signal = Signal {
            strategy_id: "s1".into(),
            symbol,
            signal_type: SignalType::ExitLong,
            suggested_price: Price::new(dec!(105)),
            suggested_quantity: Qty::ZERO,
            stop_loss: Price::ZERO,
            take_profit: None,
            reason: "exit".into(),
        };
        let verdict = engine.evaluate(&signal, &state, &account, &positions);
        match verdict {
            RiskVerdict::Approved(order) => {
                assert_eq!(order.quantity.raw(), dec!(1.500));
                assert!(order.reduce_only);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }
}
