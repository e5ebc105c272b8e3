//! Tracked open position.

use crate::decimal::{Price, Qty};
use crate::error::{DomainError, DomainResult};
use crate::side::PositionSide;
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open (or just-closed) position, cached by the execution engine against
/// the exchange's authoritative state.
///
/// Invariant: `quantity >= 0`; a reduction that would cross zero is
/// rejected by [`Position::reduce`] — callers must close the position and
/// open a new one on the other side instead: crossing becomes one close
/// plus one open.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub entry_price: Price,
    pub quantity: Qty,
    pub unrealized_pnl: Price,
    pub realized_pnl: Price,
    pub stop_loss: Price,
    pub open_time: DateTime<Utc>,
    pub leverage: u32,
}

impl Position {
    pub fn open(
        symbol: Symbol,
        side: PositionSide,
        entry_price: Price,
        quantity: Qty,
        stop_loss: Price,
        open_time: DateTime<Utc>,
        leverage: u32,
    ) -> DomainResult<Self> {
        if !quantity.is_positive() {
            return Err(DomainError::invariant_violation(
                "a newly opened position must have positive quantity",
            ));
        }
        Ok(Position {
            symbol,
            side,
            entry_price,
            quantity,
            unrealized_pnl: Price::ZERO,
            realized_pnl: Price::ZERO,
            stop_loss,
            open_time,
            leverage,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Reduce the position by `qty`. Returns an error rather than crossing
    /// zero; the caller must close and re-open instead.
    pub fn reduce(&mut self, qty: Qty) -> DomainResult<()> {
        if qty > self.quantity {
            return Err(DomainError::invalid_argument(format!(
                "cannot reduce position of {} by {qty}: would cross zero",
                self.quantity
            )));
        }
        self.quantity = self.quantity - qty;
        Ok(())
    }

    /// Recompute unrealized PnL against a mark price.
    pub fn mark(&mut self, mark_price: Price) {
        let diff = match self.side {
            PositionSide::Long => mark_price - self.entry_price,
            PositionSide::Short => self.entry_price - mark_price,
        };
        self.unrealized_pnl = diff
            .checked_mul_qty(self.quantity)
            .unwrap_or(Price::ZERO);
    }

    /// Gross PnL realized if the whole remaining quantity exits at
    /// `exit_price`: `(exit - entry) * qty` for LONG, negated for SHORT.
    pub fn gross_pnl_at(&self, exit_price: Price) -> Price {
        let diff = match self.side {
            PositionSide::Long => exit_price - self.entry_price,
            PositionSide::Short => self.entry_price - exit_price,
        };
        diff.checked_mul_qty(self.quantity).unwrap_or(Price::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_pos() -> Position {
        Position::open(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Qty::new(dec!(2)),
            Price::new(dec!(95)),
            Utc::now(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn reduce_to_zero_closes_position() {
        let mut p = long_pos();
        p.reduce(Qty::new(dec!(2))).unwrap();
        assert!(p.is_closed());
    }

    #[test]
    fn reduce_past_quantity_is_rejected() {
        let mut p = long_pos();
        assert!(p.reduce(Qty::new(dec!(3))).is_err());
    }

    #[test]
    fn gross_pnl_long_is_exit_minus_entry_times_qty() {
        let p = long_pos();
        let pnl = p.gross_pnl_at(Price::new(dec!(105)));
        assert_eq!(pnl.raw(), dec!(10.00000000));
    }

    #[test]
    fn gross_pnl_short_is_negated() {
        let mut p = long_pos();
        p.side = PositionSide::Short;
        let pnl = p.gross_pnl_at(Price::new(dec!(105)));
        assert_eq!(pnl.raw(), dec!(-10.00000000));
    }

    #[test]
    fn opening_with_zero_quantity_is_rejected() {
        let err = Position::open(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Qty::ZERO,
            Price::new(dec!(95)),
            Utc::now(),
            1,
        );
        assert!(err.is_err());
    }
}
