//! Backtest configuration and result types.

use chrono::{DateTime, Utc};
use qte_domain::{ClosedTrade, Price};
use qte_risk::RiskConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Slippage/spread/fee knobs applied at fill time: plain fixed fractions
/// rather than a volatility-scaled model, since this workspace's
/// backtests replay one symbol at a time and have no bar-level high/low
/// derived volatility signal of their own to scale against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillModel {
    /// Fraction applied against candle close on a market fill, e.g.
    /// `0.0005` for 5 bps.
    pub slippage: Decimal,
    /// Half of this fraction is added/subtracted on top of slippage when
    /// set.
    pub spread: Option<Decimal>,
    /// Fee fraction of notional charged on an immediate (market) fill.
    pub taker_fee: Decimal,
    /// Fee fraction of notional charged on a resting limit order that gets
    /// touched before it expires.
    pub maker_fee: Decimal,
    /// A resting limit order not touched within this many candles expires
    /// unfilled.
    pub limit_order_max_bars: u32,
}

impl FillModel {
    pub fn conservative_defaults() -> Self {
        FillModel {
            slippage: Decimal::new(5, 4),
            spread: None,
            taker_fee: Decimal::new(4, 4),
            maker_fee: Decimal::new(2, 4),
            limit_order_max_bars: 10,
        }
    }
}

/// Top-level backtest run configuration.
#[derive(Clone, Debug)]
pub struct BacktestConfig {
    pub initial_equity: Price,
    pub risk: RiskConfig,
    pub fill_model: FillModel,
}

/// Why a backtest run could not proceed.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("backtest requires at least one candle")]
    EmptyCandles,
    #[error("candle at index {index} belongs to symbol {found}, run was started for {expected}")]
    SymbolMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("fill model field {field} must not be negative, got {value}")]
    NegativeFillField { field: &'static str, value: Decimal },
}

/// One point on the equity curve: mark-to-market equity as of a candle's
/// close time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub equity: Price,
}

/// Full result set of a completed backtest run.
#[derive(Clone, Debug)]
pub struct BacktestReport {
    pub total_return_pct: Decimal,
    pub annualized_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub sharpe_ratio: Decimal,
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Decimal,
    pub profit_factor: Option<Decimal>,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Price,
    pub largest_loss: Price,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
}
