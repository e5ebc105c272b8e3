//! Deterministic reconciliation: compares tracked local state against an
//! exchange snapshot and reports drift. Pure logic, no I/O.
//!
//! - An order the exchange knows about that we don't => HALT.
//! - Any field drift on an order both sides know about => HALT.
//! - Any position quantity mismatch => HALT.

use crate::types::{ExchangeSnapshot, LocalSnapshot, OrderSnapshot, ReconcileAction, ReconcileDiff, ReconcileReason, ReconcileReport};
use crate::watermark::SnapshotWatermark;
use std::collections::BTreeSet;

fn push_reason_once(reasons: &mut Vec<ReconcileReason>, r: ReconcileReason) {
    if !reasons.contains(&r) {
        reasons.push(r);
    }
}

fn compare_orders(
    client_order_id: &str,
    local: &OrderSnapshot,
    exchange: &OrderSnapshot,
    diffs: &mut Vec<ReconcileDiff>,
    reasons: &mut Vec<ReconcileReason>,
) {
    let mut field_diff = |field: &'static str, local_s: String, exchange_s: String| {
        if local_s != exchange_s {
            diffs.push(ReconcileDiff::OrderMismatch {
                client_order_id: client_order_id.to_string(),
                field,
                local: local_s,
                exchange: exchange_s,
            });
            push_reason_once(reasons, ReconcileReason::OrderDrift);
        }
    };

    field_diff("side", format!("{:?}", local.side), format!("{:?}", exchange.side));
    field_diff("quantity", local.quantity.to_string(), exchange.quantity.to_string());
    field_diff("filled_quantity", local.filled_quantity.to_string(), exchange.filled_quantity.to_string());
    field_diff("status", format!("{:?}", local.status), format!("{:?}", exchange.status));
}

/// Pure content comparison between `local` and `exchange`. Use
/// [`reconcile_monotonic`] in production; call this directly only from
/// tests that aren't concerned with snapshot freshness.
pub fn reconcile(local: &LocalSnapshot, exchange: &ExchangeSnapshot) -> ReconcileReport {
    let mut reasons = Vec::new();
    let mut diffs = Vec::new();

    for client_order_id in exchange.orders.keys() {
        if !local.orders.contains_key(client_order_id) {
            diffs.push(ReconcileDiff::UnknownOrder { client_order_id: client_order_id.clone() });
            push_reason_once(&mut reasons, ReconcileReason::UnknownExchangeOrder);
        }
    }

    for (client_order_id, local_order) in &local.orders {
        if let Some(exchange_order) = exchange.orders.get(client_order_id) {
            compare_orders(client_order_id, local_order, exchange_order, &mut diffs, &mut reasons);
        }
    }

    let mut symbols: BTreeSet<&String> = BTreeSet::new();
    symbols.extend(local.positions.keys());
    symbols.extend(exchange.positions.keys());
    for symbol in symbols {
        let local_qty = local.positions.get(symbol).copied().unwrap_or(qte_domain::Qty::ZERO);
        let exchange_qty = exchange.positions.get(symbol).copied().unwrap_or(qte_domain::Qty::ZERO);
        if local_qty != exchange_qty {
            diffs.push(ReconcileDiff::PositionQtyMismatch {
                symbol: symbol.clone(),
                local: local_qty,
                exchange: exchange_qty,
            });
            push_reason_once(&mut reasons, ReconcileReason::PositionMismatch);
        }
    }

    reasons.sort();
    diffs.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

    if reasons.is_empty() {
        ReconcileReport::clean()
    } else {
        ReconcileReport { action: ReconcileAction::Halt, reasons, diffs }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("stale exchange snapshot rejected: {0:?}")]
pub struct StaleSnapshot(pub crate::watermark::SnapshotFreshness);

/// The required production entry point: enforces snapshot monotonicity via
/// `wm` before running content comparison. A stale snapshot is rejected
/// outright rather than silently compared.
pub fn reconcile_monotonic(
    wm: &mut SnapshotWatermark,
    local: &LocalSnapshot,
    exchange: &ExchangeSnapshot,
) -> Result<ReconcileReport, StaleSnapshot> {
    let freshness = wm.accept(exchange);
    if freshness.is_rejected() {
        return Err(StaleSnapshot(freshness));
    }
    Ok(reconcile(local, exchange))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{OrderStatus, Qty, Side, Symbol};
    use rust_decimal_macros::dec;

    fn order(qty: &str, filled: &str, status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            client_order_id: "cid-1".into(),
            symbol: Symbol::parse("BTC-USDT").unwrap(),
            side: Side::Buy,
            quantity: Qty::new(qty.parse().unwrap()),
            filled_quantity: Qty::new(filled.parse().unwrap()),
            status,
        }
    }

    #[test]
    fn matching_snapshots_are_clean() {
        let mut local = LocalSnapshot::empty();
        local.orders.insert("cid-1".into(), order("1", "0", OrderStatus::Submitted));
        local.positions.insert("BTC-USDT".into(), Qty::new(dec!(1)));

        let mut exchange = ExchangeSnapshot::empty();
        exchange.orders.insert("cid-1".into(), order("1", "0", OrderStatus::Submitted));
        exchange.positions.insert("BTC-USDT".into(), Qty::new(dec!(1)));

        assert!(reconcile(&local, &exchange).is_clean());
    }

    #[test]
    fn unknown_exchange_order_halts() {
        let local = LocalSnapshot::empty();
        let mut exchange = ExchangeSnapshot::empty();
        exchange.orders.insert("cid-1".into(), order("1", "0", OrderStatus::Submitted));
        let report = reconcile(&local, &exchange);
        assert_eq!(report.action, crate::types::ReconcileAction::Halt);
        assert!(report.reasons.contains(&ReconcileReason::UnknownExchangeOrder));
    }

    #[test]
    fn position_mismatch_halts() {
        let mut local = LocalSnapshot::empty();
        local.positions.insert("BTC-USDT".into(), Qty::new(dec!(1)));
        let mut exchange = ExchangeSnapshot::empty();
        exchange.positions.insert("BTC-USDT".into(), Qty::new(dec!(2)));
        let report = reconcile(&local, &exchange);
        assert!(report.reasons.contains(&ReconcileReason::PositionMismatch));
    }

    #[test]
    fn filled_quantity_drift_halts() {
        let mut local = LocalSnapshot::empty();
        local.orders.insert("cid-1".into(), order("1", "0", OrderStatus::Submitted));
        let mut exchange = ExchangeSnapshot::empty();
        exchange.orders.insert("cid-1".into(), order("1", "0.5", OrderStatus::Partial));
        let report = reconcile(&local, &exchange);
        assert!(report.reasons.contains(&ReconcileReason::OrderDrift));
    }

    #[test]
    fn stale_snapshot_is_rejected_before_comparison() {
        use chrono::TimeZone;
        let mut wm = SnapshotWatermark::new();
        let local = LocalSnapshot::empty();
        let mut fresh = ExchangeSnapshot::empty();
        fresh.fetched_at = Some(chrono::Utc.timestamp_opt(100, 0).unwrap());
        reconcile_monotonic(&mut wm, &local, &fresh).unwrap();

        let mut stale = ExchangeSnapshot::empty();
        stale.fetched_at = Some(chrono::Utc.timestamp_opt(50, 0).unwrap());
        assert!(reconcile_monotonic(&mut wm, &local, &stale).is_err());
    }
}
