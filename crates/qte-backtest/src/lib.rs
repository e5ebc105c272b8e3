//! Deterministic historical replay over the strategy/risk pipeline (spec
//! §4.6): same strategy and risk code paths as live trading, fills
//! simulated with a configurable slippage/spread/fee model instead of a
//! real exchange, so a backtested edge is meant to survive in production.

pub mod engine;
pub mod metrics;
pub mod types;

pub use engine::BacktestEngine;
pub use types::{BacktestConfig, BacktestError, BacktestReport, EquityPoint, FillModel};
