//! Flat-file persistence: per-order JSON records, health supervisor state,
//! and the backtest CSV trade log. A key/value file contract,
//! not a database — every write is atomic (temp file + rename) and a
//! corrupt file is quarantined rather than silently dropped.

pub mod error;
pub mod health_store;
pub mod order_store;
pub mod trade_log;

pub use error::PersistenceError;
pub use health_store::HealthStore;
pub use order_store::OrderStore;
pub use trade_log::{TradeLogIndicators, TradeLogWriter};
