//! Deterministic historical replay: drives the same
//! [`qte_strategy::StrategyEngine`] dispatch loop and [`qte_risk::RiskEngine`]
//! veto pipeline used live, over an in-memory candle series, simulating
//! fills with a configurable slippage/spread/fee model instead of a real
//! exchange.
//!
//! Per-bar pipeline: validate candle, dispatch to the strategy, fill any
//! pending signal, update the tracked position, push an equity-curve
//! point, then flatten any still-open position at the final close. No
//! integrity gate, corporate-action handling, allocation caps, PDT, or
//! kill-switch machinery — a single-symbol, single-strategy replay has no
//! use for them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use qte_domain::{ClosedTrade, ExitReason, KLine, Position, PositionSide, Price, Qty, Side, Symbol};
use qte_risk::{AccountState, ApprovedOrder, RiskConfig, RiskEngine, RiskState, RiskVerdict};
use qte_strategy::{Strategy, StrategyEngine, StrategyGate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{BacktestConfig, BacktestError, EquityPoint, FillModel};

pub struct BacktestEngine {
    risk: RiskEngine,
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        validate_fill_model(&config.fill_model)?;
        let risk = RiskEngine::new(config.risk.clone());
        Ok(BacktestEngine { risk, config })
    }

    pub fn risk_config(&self) -> &RiskConfig {
        self.risk.config()
    }

    /// Replay `candles` (all from a single symbol/interval, oldest first)
    /// through `strategy`, consulting `gate` before every `analyze` call —
    /// passing a real [`qte_health::HealthSupervisor`] here, rather than
    /// `AlwaysEnabled`, is what makes a backtest reflect the same
    /// auto-disable behavior production would apply.
    pub fn run(
        &self,
        strategy: Box<dyn Strategy>,
        candles: &[KLine],
        gate: &dyn StrategyGate,
    ) -> Result<crate::types::BacktestReport, BacktestError> {
        let first = candles.first().ok_or(BacktestError::EmptyCandles)?;
        let symbol = first.symbol.clone();
        let interval = first.interval;
        let strategy_id = strategy.spec().strategy_id.clone();

        for (index, candle) in candles.iter().enumerate() {
            if candle.symbol != symbol {
                return Err(BacktestError::SymbolMismatch {
                    index,
                    expected: symbol.pair_string(),
                    found: candle.symbol.pair_string(),
                });
            }
        }

        let mut strategy_engine = StrategyEngine::new();
        strategy_engine
            .register(strategy)
            .expect("a freshly constructed engine with one registration cannot collide");

        let symbol_key = symbol.pair_string();
        let mut tracked: HashMap<String, Position> = HashMap::new();
        let mut risk_state = RiskState::new(self.config.initial_equity);
        let mut cash_equity = self.config.initial_equity;
        let mut closed_trades: Vec<ClosedTrade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len());

        for i in 0..candles.len() {
            let candle = &candles[i];

            // Step 1: trailing-stop check, pessimistic fill, no favorable
            // slippage.
            if let Some(position) = tracked.get(&symbol_key) {
                if trailing_stop_crossed(position, candle) {
                    let position = tracked.remove(&symbol_key).expect("checked above");
                    let trade = self.close_at(
                        &position,
                        position.stop_loss,
                        position.quantity,
                        candle.close_time,
                        &strategy_id,
                        ExitReason::StopLoss,
                    );
                    cash_equity = cash_equity + trade.net_pnl();
                    risk_state.record_trade_outcome(&strategy_id, trade.net_pnl());
                    strategy_engine.record_trade(&strategy_id);
                    closed_trades.push(trade);
                }
            }

            // Step 2: strategy dispatch over the full window seen so far.
            let window = &candles[0..=i];
            let signals = strategy_engine.on_candle_close(&symbol, interval, window, &tracked, gate);

            for signal in signals {
                let account = AccountState {
                    equity: current_equity(cash_equity, &tracked, &symbol_key),
                    available_balance: cash_equity,
                    unrealized_pnl: tracked.get(&symbol_key).map(|p| p.unrealized_pnl).unwrap_or(Price::ZERO),
                };
                let verdict = self.risk.evaluate(&signal.signal, &risk_state, &account, &tracked);
                let RiskVerdict::Approved(approved) = verdict else {
                    continue;
                };

                if signal.signal.signal_type.is_entry() {
                    if tracked.contains_key(&symbol_key) {
                        debug!(strategy_id = %signal.strategy_id, "entry signal ignored, a position is already tracked");
                        continue;
                    }
                    let side = signal.signal.side();
                    let fill_price = slipped_fill_price(candle.close, side, &self.config.fill_model);
                    let position_side = if side == Side::Buy { PositionSide::Long } else { PositionSide::Short };
                    let position = Position::open(
                        symbol.clone(),
                        position_side,
                        fill_price,
                        approved.quantity,
                        approved.stop_loss,
                        candle.close_time,
                        self.config.risk.leverage,
                    )
                    .expect("risk gate only approves positive quantity entries");
                    let fee = fee_at(notional(fill_price, approved.quantity), self.config.fill_model.taker_fee);
                    cash_equity = cash_equity - fee;
                    tracked.insert(symbol_key.clone(), position);
                } else {
                    let Some(position) = tracked.get_mut(&symbol_key) else {
                        continue;
                    };
                    let side = signal.signal.side();
                    let fill_price = slipped_fill_price(candle.close, side, &self.config.fill_model);
                    let exit_qty = approved.quantity.min(position.quantity);
                    let trade = self.close_at(position, fill_price, exit_qty, candle.close_time, &strategy_id, ExitReason::StrategyExit);
                    position.reduce(exit_qty).expect("exit_qty is bounded by tracked position quantity");
                    cash_equity = cash_equity + trade.net_pnl();
                    risk_state.record_trade_outcome(&strategy_id, trade.net_pnl());
                    strategy_engine.record_trade(&strategy_id);
                    if position.is_closed() {
                        tracked.remove(&symbol_key);
                    }
                    closed_trades.push(trade);
                }
            }

            // Step 5: mark-to-market equity curve point.
            if let Some(position) = tracked.get_mut(&symbol_key) {
                position.mark(candle.close);
            }
            let equity_now = current_equity(cash_equity, &tracked, &symbol_key);
            risk_state.update_peak_equity(equity_now);
            equity_curve.push(EquityPoint { time: candle.close_time, equity: equity_now });
        }

        // Step 6: force-close whatever remains open at the final close.
        if let Some(position) = tracked.remove(&symbol_key) {
            let last = candles.last().expect("validated non-empty above");
            let trade = self.close_at(
                &position,
                last.close,
                position.quantity,
                last.close_time,
                &strategy_id,
                ExitReason::EndOfBacktest,
            );
            cash_equity = cash_equity + trade.net_pnl();
            risk_state.record_trade_outcome(&strategy_id, trade.net_pnl());
            if let Some(last_point) = equity_curve.last_mut() {
                last_point.equity = cash_equity;
            }
            closed_trades.push(trade);
        }

        Ok(crate::metrics::compute_report(self.config.initial_equity, equity_curve, closed_trades))
    }

    fn close_at(
        &self,
        position: &Position,
        fill_price: Price,
        quantity: Qty,
        exit_time: DateTime<Utc>,
        strategy_id: &str,
        reason: ExitReason,
    ) -> ClosedTrade {
        let gross = match position.side {
            PositionSide::Long => fill_price - position.entry_price,
            PositionSide::Short => position.entry_price - fill_price,
        }
        .checked_mul_qty(quantity)
        .unwrap_or(Price::ZERO);
        let fee = fee_at(notional(fill_price, quantity), self.config.fill_model.taker_fee);
        ClosedTrade::new(
            position.symbol.clone(),
            position.side,
            position.entry_price,
            fill_price,
            quantity,
            gross,
            fee,
            position.open_time,
            exit_time,
            strategy_id.to_string(),
            reason,
        )
    }
}

fn current_equity(cash: Price, tracked: &HashMap<String, Position>, symbol_key: &str) -> Price {
    cash + tracked.get(symbol_key).map(|p| p.unrealized_pnl).unwrap_or(Price::ZERO)
}

fn trailing_stop_crossed(position: &Position, candle: &KLine) -> bool {
    match position.side {
        PositionSide::Long => candle.low <= position.stop_loss,
        PositionSide::Short => candle.high >= position.stop_loss,
    }
}

/// BUY fills worse (higher) than close, SELL fills worse (lower) than
/// close; half of `spread`, if configured, widens it further.
fn slipped_fill_price(close: Price, side: Side, fill_model: &FillModel) -> Price {
    let mut adjustment = fill_model.slippage;
    if let Some(spread) = fill_model.spread {
        adjustment += spread / Decimal::TWO;
    }
    match side {
        Side::Buy => Price::new(close.raw() * (Decimal::ONE + adjustment)),
        Side::Sell => Price::new(close.raw() * (Decimal::ONE - adjustment)),
    }
}

fn notional(price: Price, qty: Qty) -> Price {
    price.checked_mul_qty(qty).unwrap_or(Price::ZERO)
}

fn fee_at(notional: Price, rate: Decimal) -> Price {
    Price::new(notional.raw() * rate)
}

fn validate_fill_model(fill_model: &FillModel) -> Result<(), BacktestError> {
    if fill_model.slippage < Decimal::ZERO {
        return Err(BacktestError::NegativeFillField { field: "slippage", value: fill_model.slippage });
    }
    if let Some(spread) = fill_model.spread {
        if spread < Decimal::ZERO {
            return Err(BacktestError::NegativeFillField { field: "spread", value: spread });
        }
    }
    if fill_model.taker_fee < Decimal::ZERO {
        return Err(BacktestError::NegativeFillField { field: "taker_fee", value: fill_model.taker_fee });
    }
    if fill_model.maker_fee < Decimal::ZERO {
        return Err(BacktestError::NegativeFillField { field: "maker_fee", value: fill_model.maker_fee });
    }
    Ok(())
}
