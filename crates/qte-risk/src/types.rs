use qte_domain::{Percent, Price};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Risk gate thresholds. `Percent` fields are
/// percentage points (e.g. `Percent::new(1.00)` means 1%); use
/// [`Percent`]'s `.fraction()` extension below to get the 0..1 multiplier
/// the sizing formulas need.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfig {
    /// Fraction of equity risked at stop distance on one trade.
    pub risk_per_trade: Percent,
    /// Fraction of equity a single position's notional may occupy.
    pub max_position_ratio: Percent,
    /// Hard cap on `(entry - stop) / entry`.
    pub max_stop_loss_percent: Percent,
    pub max_consecutive_losses: u32,
    pub max_drawdown_percent: Percent,
    pub leverage: u32,
    /// Safety multiplier (>= 1) on required margin.
    pub margin_buffer: Decimal,
}

impl RiskConfig {
    pub fn conservative_defaults() -> Self {
        RiskConfig {
            risk_per_trade: Percent::new(Decimal::new(100, 2)),
            max_position_ratio: Percent::new(Decimal::new(2000, 2)),
            max_stop_loss_percent: Percent::new(Decimal::new(500, 2)),
            max_consecutive_losses: 3,
            max_drawdown_percent: Percent::new(Decimal::new(1500, 2)),
            leverage: 3,
            margin_buffer: Decimal::new(120, 2),
        }
    }
}

/// Extension converting a percentage-point value to a 0..1 fraction for
/// the position-sizing formulas below.
pub trait AsFraction {
    fn fraction(self) -> Decimal;
}

impl AsFraction for Percent {
    fn fraction(self) -> Decimal {
        self.raw() / Decimal::ONE_HUNDRED
    }
}

/// Account snapshot passed into every `evaluate` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccountState {
    pub equity: Price,
    pub available_balance: Price,
    pub unrealized_pnl: Price,
}

/// Why a signal was vetoed, or that it was allowed — logged on every call,
/// never raised as an exception.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReasonCode {
    Allowed,
    EmergencyStopped,
    ConsecutiveLossLimitReached,
    DrawdownLimitBreached,
    StopLossMissing,
    StopLossWrongSide,
    StopDistanceExceeded,
    PositionSizeNonPositive,
    ExitWithoutTrackedPosition,
}

impl ReasonCode {
    pub const fn code(self) -> &'static str {
        match self {
            ReasonCode::Allowed => "ALLOWED",
            ReasonCode::EmergencyStopped => "EMERGENCY_STOPPED",
            ReasonCode::ConsecutiveLossLimitReached => "CONSECUTIVE_LOSS_LIMIT_REACHED",
            ReasonCode::DrawdownLimitBreached => "DRAWDOWN_LIMIT_BREACHED",
            ReasonCode::StopLossMissing => "STOP_LOSS_MISSING",
            ReasonCode::StopLossWrongSide => "STOP_LOSS_WRONG_SIDE",
            ReasonCode::StopDistanceExceeded => "STOP_DISTANCE_EXCEEDED",
            ReasonCode::PositionSizeNonPositive => "POSITION_SIZE_NON_POSITIVE",
            ReasonCode::ExitWithoutTrackedPosition => "EXIT_WITHOUT_TRACKED_POSITION",
        }
    }
}

/// An order ready to submit, produced by a successful `evaluate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct ApprovedOrder {
    pub quantity: qte_domain::Qty,
    pub price: Price,
    pub stop_loss: Price,
    pub take_profit: Option<Price>,
    pub reduce_only: bool,
}

/// Output of [`crate::engine::RiskEngine::evaluate`]: an order ready to
/// submit, or a veto with a reason code. Modeled as an enum rather than
/// `Option<ApprovedOrder>` so a veto always carries its reason — the
/// source's "null return" is flattened into one typed result.
#[derive(Clone, Debug, PartialEq)]
pub enum RiskVerdict {
    Approved(ApprovedOrder),
    Vetoed(ReasonCode),
}

impl RiskVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskVerdict::Approved(_))
    }
}

/// Rolling per-strategy counters kept for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrategyStats {
    pub trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub realized_pnl: Price,
}

impl StrategyStats {
    fn default_init() -> Self {
        StrategyStats {
            trades: 0,
            wins: 0,
            losses: 0,
            realized_pnl: Price::ZERO,
        }
    }
}

/// Sticky mutable state the risk gate carries across calls: rolling
/// per-strategy stats plus the NORMAL/STOPPED emergency-stop machine.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskState {
    pub peak_equity: Price,
    pub consecutive_losses: u32,
    pub cumulative_realized_pnl: Price,
    pub emergency_stopped: bool,
    pub per_strategy: HashMap<String, StrategyStats>,
}

impl RiskState {
    pub fn new(initial_equity: Price) -> Self {
        RiskState {
            peak_equity: initial_equity,
            consecutive_losses: 0,
            cumulative_realized_pnl: Price::ZERO,
            emergency_stopped: false,
            per_strategy: HashMap::new(),
        }
    }

    /// Update the monotonic high-water mark. Called on every account
    /// update.
    pub fn update_peak_equity(&mut self, equity: Price) {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Record a closed trade's outcome: bumps the consecutive-loss counter
    /// on a loss, resets it on first win.
    pub fn record_trade_outcome(&mut self, strategy_id: &str, net_pnl: Price) {
        self.cumulative_realized_pnl = self.cumulative_realized_pnl + net_pnl;
        if net_pnl.is_positive() {
            self.consecutive_losses = 0;
        } else if net_pnl.is_negative() {
            self.consecutive_losses = self.consecutive_losses.saturating_add(1);
        }
        let stats = self
            .per_strategy
            .entry(strategy_id.to_string())
            .or_insert_with(StrategyStats::default_init);
        stats.trades += 1;
        stats.realized_pnl = stats.realized_pnl + net_pnl;
        if net_pnl.is_positive() {
            stats.wins += 1;
        } else if net_pnl.is_negative() {
            stats.losses += 1;
        }
    }

    /// `(peakEquity - currentEquity) / peakEquity`, `Decimal::ZERO` if
    /// `peakEquity` is zero (no drawdown is measurable from a zero base).
    pub fn drawdown_fraction(&self, current_equity: Price) -> Decimal {
        if self.peak_equity.is_zero() {
            return Decimal::ZERO;
        }
        (self.peak_equity - current_equity).raw() / self.peak_equity.raw()
    }

    /// NORMAL -> STOPPED. Only explicit `resume_trading` reverses this
    ///.
    pub fn emergency_stop(&mut self) {
        self.emergency_stopped = true;
    }

    pub fn resume_trading(&mut self) {
        self.emergency_stopped = false;
    }
}
