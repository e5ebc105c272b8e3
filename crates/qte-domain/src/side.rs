//! Order side, position side, order type/status, and the mapping between
//! signal type and order side: `ENTRY_LONG`/`EXIT_SHORT` map to BUY,
//! `ENTRY_SHORT`/`EXIT_LONG` map to SELL.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// The order side that *opens* a position on this side.
    pub const fn entry_side(self) -> Side {
        match self {
            PositionSide::Long => Side::Buy,
            PositionSide::Short => Side::Sell,
        }
    }

    /// The order side that *closes* a position on this side.
    pub const fn exit_side(self) -> Side {
        match self {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Submitted,
    Partial,
    Filled,
    Canceled,
    Rejected,
    Failed,
}

impl OrderStatus {
    /// `true` once the order can no longer transition: the lifecycle is
    /// `PENDING → SUBMITTED → (PARTIAL*) → FILLED | CANCELED | REJECTED |
    /// FAILED`.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_entry_is_buy_exit_is_sell() {
        assert_eq!(PositionSide::Long.entry_side(), Side::Buy);
        assert_eq!(PositionSide::Long.exit_side(), Side::Sell);
    }

    #[test]
    fn short_entry_is_sell_exit_is_buy() {
        assert_eq!(PositionSide::Short.entry_side(), Side::Sell);
        assert_eq!(PositionSide::Short.exit_side(), Side::Buy);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Partial.is_terminal());
    }
}
