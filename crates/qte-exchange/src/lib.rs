//! Concrete exchange adapters. The `Exchange`-shaped trait itself
//! (`ExchangeAdapter`), and the webhook notifier capability interfaces its
//! caller uses, both live in `qte-execution` — this crate only provides
//! implementations of the adapter side.

pub mod paper;

pub use paper::PaperExchange;
