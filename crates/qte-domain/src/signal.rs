//! Strategy → risk-gate intent.

use crate::decimal::{Price, Qty};
use crate::side::Side;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    EntryLong,
    EntryShort,
    ExitLong,
    ExitShort,
}

impl SignalType {
    pub const fn side(self) -> Side {
        match self {
            SignalType::EntryLong | SignalType::ExitShort => Side::Buy,
            SignalType::EntryShort | SignalType::ExitLong => Side::Sell,
        }
    }

    pub const fn is_entry(self) -> bool {
        matches!(self, SignalType::EntryLong | SignalType::EntryShort)
    }

    pub const fn is_exit(self) -> bool {
        !self.is_entry()
    }
}

/// What a strategy emits on a closed candle.
///
/// `suggested_quantity` may be `Qty::ZERO`, meaning "size it for me" on
/// entry or "close the whole tracked position" on exit. `stop_loss` may be
/// `Price::ZERO` only on an exit signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_id: String,
    pub symbol: Symbol,
    pub signal_type: SignalType,
    pub suggested_price: Price,
    pub suggested_quantity: Qty,
    pub stop_loss: Price,
    pub take_profit: Option<Price>,
    pub reason: String,
}

impl Signal {
    pub fn side(&self) -> Side {
        self.signal_type.side()
    }
}
