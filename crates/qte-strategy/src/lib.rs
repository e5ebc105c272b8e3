//! Strategy capability interface and the engine that dispatches closed
//! candles to every subscribed strategy, enforcing cooldown and the
//! health-supervisor gate.

pub mod engine;
pub mod gate;
pub mod strategy;
pub mod types;

pub use engine::{StrategyEngine, StrategySignal};
pub use gate::{AlwaysEnabled, StrategyGate};
pub use strategy::Strategy;
pub use types::{StrategyEngineError, StrategySpec};
