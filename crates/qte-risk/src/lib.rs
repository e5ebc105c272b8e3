//! Risk Control: sizes, validates, and may veto every signal; tracks
//! emergency-stop/consecutive-loss/drawdown state.

pub mod engine;
pub mod stop_loss;
pub mod types;

pub use engine::RiskEngine;
pub use stop_loss::{evaluate_stop_sync, StopSyncDecision};
pub use types::{
    AccountState, ApprovedOrder, AsFraction, ReasonCode, RiskConfig, RiskState, RiskVerdict,
    StrategyStats,
};
