//! Strategy Health Supervisor: rolling expected-value tracking that can
//! auto-disable or degrade a strategy.

pub mod calculator;
pub mod state;
pub mod supervisor;

pub use calculator::{RollingEvCalculator, RollingEvSnapshot};
pub use state::{transition, HealthConfig, HealthState};
pub use supervisor::{HealthSupervisor, PersistedStrategyHealth};
