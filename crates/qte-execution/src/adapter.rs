//! The single choke-point every order must pass through to reach an
//! exchange: all broker calls are centralized behind one adapter boundary.
//!
//! [`TradingEngine`](crate::engine::TradingEngine) is generic over `A:
//! ExchangeAdapter` the same way the market-data side is generic over a
//! candle source: concrete adapters (a paper simulator, a live REST client)
//! live in a separate crate and are injected here, never the reverse.

use crate::types::{CancelRequest, OrderStatusReport, SubmitRequest, SubmitResponse, Ticker};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("exchange rejected the request: {0}")]
    Rejected(String),
}

impl ExchangeError {
    /// `true` for errors a bounded retry loop should re-attempt
    /// (`TransientNetwork`/`RateLimited`); `false` for `Rejected`, which is
    /// terminal and must surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::TransientNetwork(_) | ExchangeError::RateLimited { .. })
    }
}

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn submit(&self, req: SubmitRequest) -> Result<SubmitResponse, ExchangeError>;
    async fn cancel(&self, req: CancelRequest) -> Result<(), ExchangeError>;
    /// Current top-of-book, used by entry reprice.
    async fn fetch_ticker(&self, symbol: &qte_domain::Symbol) -> Result<Ticker, ExchangeError>;
    /// Current fill state of a previously submitted order, identified by
    /// the exchange's own order id. Polled after submit until terminal —
    /// a bare submit acknowledgement never carries enough information to
    /// size a position or compute a fill.
    async fn get_order(
        &self,
        exchange_order_id: &str,
        symbol: &qte_domain::Symbol,
    ) -> Result<OrderStatusReport, ExchangeError>;
}
