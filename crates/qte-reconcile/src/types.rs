//! Snapshot and report shapes for local-vs-exchange reconciliation.

use qte_domain::{OrderStatus, Price, Qty, Side, Symbol};
use std::collections::BTreeMap;

/// What we locally believe about one order, trimmed to the fields that can
/// drift against the exchange's view.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderSnapshot {
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Qty,
    pub filled_quantity: Qty,
    pub status: OrderStatus,
}

/// Locally tracked state: the engine's own bookkeeping, keyed by
/// `client_order_id` for orders and `Symbol::pair_string()` for positions.
#[derive(Clone, Debug, Default)]
pub struct LocalSnapshot {
    pub orders: BTreeMap<String, OrderSnapshot>,
    pub positions: BTreeMap<String, Qty>,
}

impl LocalSnapshot {
    pub fn empty() -> Self {
        LocalSnapshot::default()
    }
}

/// State as reported by the exchange, fetched at `fetched_at`.
#[derive(Clone, Debug, Default)]
pub struct ExchangeSnapshot {
    pub orders: BTreeMap<String, OrderSnapshot>,
    pub positions: BTreeMap<String, Qty>,
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExchangeSnapshot {
    pub fn empty() -> Self {
        ExchangeSnapshot::default()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    Clean,
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReconcileReason {
    UnknownExchangeOrder,
    PositionMismatch,
    OrderDrift,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReconcileDiff {
    UnknownOrder { client_order_id: String },
    PositionQtyMismatch { symbol: String, local: Qty, exchange: Qty },
    OrderMismatch { client_order_id: String, field: &'static str, local: String, exchange: String },
}

/// Deterministic result of one reconciliation pass. `reasons` and `diffs`
/// are sorted so two runs over the same inputs produce byte-identical
/// output (spec requirement: reconcile reports must be reproducible).
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileReport {
    pub action: ReconcileAction,
    pub reasons: Vec<ReconcileReason>,
    pub diffs: Vec<ReconcileDiff>,
}

impl ReconcileReport {
    pub fn clean() -> Self {
        ReconcileReport { action: ReconcileAction::Clean, reasons: Vec::new(), diffs: Vec::new() }
    }

    pub fn is_clean(&self) -> bool {
        self.action == ReconcileAction::Clean
    }
}
