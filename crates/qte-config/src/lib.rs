//! Layered configuration load, canonicalization, and secret resolution.
//! `CoreConfig` is built once at startup and handed to every component
//! that needs it; there is no global singleton.

pub mod consumption;
pub mod core_config;
pub mod load;
pub mod secrets;

pub use consumption::{consumed_pointers, unused_top_level_keys, warn_unused_keys, RunMode};
pub use core_config::{BacktestSection, CoreConfig, LiveSection, MarketDataSection, NotifySection};
pub use load::{empty_config, load_layered_yaml, LoadedConfig};
pub use secrets::{resolve_secrets, ResolvedSecrets};
