//! Local-vs-exchange state reconciliation.
//!
//! The trading engine's own bookkeeping (orders, positions) can drift from
//! the exchange's view after a missed websocket message, a restart, or a
//! partial network failure. This crate compares the two deterministically
//! and reports exactly what differs, so callers can halt trading rather
//! than act on stale assumptions.

pub mod engine;
pub mod types;
pub mod watermark;

pub use engine::{reconcile, reconcile_monotonic, StaleSnapshot};
pub use types::{
    ExchangeSnapshot, LocalSnapshot, OrderSnapshot, ReconcileAction, ReconcileDiff,
    ReconcileReason, ReconcileReport,
};
pub use watermark::{SnapshotFreshness, SnapshotWatermark};
