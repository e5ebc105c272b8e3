//! Execution Engine: submits risk-approved orders to the exchange,
//! tracks the resulting positions and order lifecycle, and resyncs
//! protective stops as they trail.

pub mod adapter;
pub mod engine;
pub mod id_map;
pub mod notifier;
pub mod oms;
pub mod types;

pub use adapter::{ExchangeAdapter, ExchangeError};
pub use engine::TradingEngine;
pub use id_map::ExchangeOrderMap;
pub use notifier::{
    AlertCooldown, ExchangeUnavailableEvent, FillEventCache, LoggingNotifier, NetworkAlertNotifier,
    NullNotifier, TradeFillEvent, TradeFillNotifier,
};
pub use types::{
    bucket_time, derive_client_order_id, reprice_entry, CancelRequest, ExchangePositionView,
    ExecutionError, OrderStatusKind, OrderStatusReport, SubmitRequest, SubmitResponse, Ticker,
};
