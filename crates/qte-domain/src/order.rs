//! Order lifecycle record.

use crate::decimal::{Price, Qty};
use crate::error::{DomainError, DomainResult};
use crate::side::{OrderStatus, OrderType, Side};
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single order and its fill state.
///
/// Lifecycle: `Pending -> Submitted -> (Partial)* -> Filled | Canceled |
/// Rejected | Failed`. `filled_quantity` is monotonically non-decreasing —
/// enforced by [`Order::apply_fill`], never by direct field mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub client_order_id: String,
    pub exchange_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Qty,
    pub price: Option<Price>,
    pub status: OrderStatus,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    pub create_time: DateTime<Utc>,
    pub fill_time: Option<DateTime<Utc>>,
    pub avg_fill_price: Option<Price>,
    pub filled_quantity: Qty,
    pub strategy_id: String,
    pub reduce_only: bool,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        client_order_id: String,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: Qty,
        price: Option<Price>,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
        create_time: DateTime<Utc>,
        strategy_id: String,
        reduce_only: bool,
    ) -> Self {
        Order {
            order_id: Uuid::new_v4(),
            client_order_id,
            exchange_order_id: None,
            symbol,
            side,
            order_type,
            quantity,
            price,
            status: OrderStatus::Pending,
            stop_loss,
            take_profit,
            create_time,
            fill_time: None,
            avg_fill_price: None,
            filled_quantity: Qty::ZERO,
            strategy_id,
            reduce_only,
        }
    }

    /// Record a (possibly partial) fill. Rejects a `new_filled_quantity`
    /// that would move the monotonic counter backwards.
    pub fn apply_fill(
        &mut self,
        new_filled_quantity: Qty,
        avg_fill_price: Price,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if new_filled_quantity < self.filled_quantity {
            return Err(DomainError::invariant_violation(format!(
                "filled_quantity must be non-decreasing: {} -> {}",
                self.filled_quantity, new_filled_quantity
            )));
        }
        self.filled_quantity = new_filled_quantity;
        self.avg_fill_price = Some(avg_fill_price);
        if self.filled_quantity >= self.quantity {
            self.status = OrderStatus::Filled;
            self.fill_time = Some(now);
        } else if self.filled_quantity.is_positive() {
            self.status = OrderStatus::Partial;
        }
        Ok(())
    }

    pub fn mark_submitted(&mut self, exchange_order_id: String) {
        self.exchange_order_id = Some(exchange_order_id);
        self.status = OrderStatus::Submitted;
    }

    pub fn mark_rejected(&mut self) {
        self.status = OrderStatus::Rejected;
    }

    pub fn mark_failed(&mut self) {
        self.status = OrderStatus::Failed;
    }

    pub fn mark_canceled(&mut self) {
        self.status = OrderStatus::Canceled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Order {
        Order::new_pending(
            "cid-1".into(),
            Symbol::parse("BTC-USDT").unwrap(),
            Side::Buy,
            OrderType::Market,
            Qty::new(dec!(1)),
            None,
            Some(Price::new(dec!(95))),
            None,
            Utc::now(),
            "strat-1".into(),
            false,
        )
    }

    #[test]
    fn partial_then_full_fill_transitions_correctly() {
        let mut o = sample();
        let t = Utc::now();
        o.apply_fill(Qty::new(dec!(0.5)), Price::new(dec!(100)), t)
            .unwrap();
        assert_eq!(o.status, OrderStatus::Partial);
        o.apply_fill(Qty::new(dec!(1)), Price::new(dec!(100.5)), t)
            .unwrap();
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.fill_time, Some(t));
    }

    #[test]
    fn fill_quantity_cannot_decrease() {
        let mut o = sample();
        let t = Utc::now();
        o.apply_fill(Qty::new(dec!(0.5)), Price::new(dec!(100)), t)
            .unwrap();
        let err = o.apply_fill(Qty::new(dec!(0.2)), Price::new(dec!(100)), t);
        assert!(err.is_err());
    }

    #[test]
    fn reject_and_fail_are_terminal() {
        let mut o = sample();
        o.mark_rejected();
        assert!(o.status.is_terminal());
        let mut o2 = sample();
        o2.mark_failed();
        assert!(o2.status.is_terminal());
    }
}
