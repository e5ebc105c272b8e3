//! Terminal record of a closed position.

use crate::decimal::{Price, Qty};
use crate::side::PositionSide;
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason a position was closed; carried alongside the [`ClosedTrade`] for
/// notifications and the backtest CSV log's `exit_reason` column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StrategyExit,
    StopLoss,
    Reconciliation,
    EndOfBacktest,
}

/// Immutable, post-exit trade record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub trade_id: Uuid,
    pub symbol: Symbol,
    pub side: PositionSide,
    pub entry_price: Price,
    pub exit_price: Price,
    pub quantity: Qty,
    pub gross_pnl: Price,
    pub fee: Price,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub strategy_id: String,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        side: PositionSide,
        entry_price: Price,
        exit_price: Price,
        quantity: Qty,
        gross_pnl: Price,
        fee: Price,
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
        strategy_id: String,
        exit_reason: ExitReason,
    ) -> Self {
        ClosedTrade {
            trade_id: Uuid::new_v4(),
            symbol,
            side,
            entry_price,
            exit_price,
            quantity,
            gross_pnl,
            fee,
            entry_time,
            exit_time,
            strategy_id,
            exit_reason,
        }
    }

    /// `netPnl = grossPnl - fee`.
    pub fn net_pnl(&self) -> Price {
        self.gross_pnl - self.fee
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl().is_positive()
    }

    pub fn is_loss(&self) -> bool {
        self.net_pnl().is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(gross: &str, fee: &str) -> ClosedTrade {
        let t = Utc::now();
        ClosedTrade::new(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Price::new(dec!(105)),
            Qty::new(dec!(1)),
            Price::new(gross.parse().unwrap()),
            Price::new(fee.parse().unwrap()),
            t,
            t,
            "strat-1".into(),
            ExitReason::StrategyExit,
        )
    }

    #[test]
    fn net_pnl_is_gross_minus_fee() {
        let t = sample("10", "1");
        assert_eq!(t.net_pnl().raw(), dec!(9.00000000));
    }

    #[test]
    fn win_loss_flat_are_mutually_exclusive() {
        let win = sample("10", "1");
        assert!(win.is_win() && !win.is_loss());
        let loss = sample("1", "10");
        assert!(loss.is_loss() && !loss.is_win());
        let flat = sample("5", "5");
        assert!(!flat.is_win() && !flat.is_loss());
    }
}
