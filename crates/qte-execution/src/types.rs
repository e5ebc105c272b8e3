//! Broker-agnostic request/response types and the client-order-id
//! derivation that makes every submit idempotent.

use qte_domain::{Price, PositionSide, Qty, Side, Symbol};
use sha2::{Digest, Sha256};

/// A snapshot of top-of-book prices, used to re-price a signal against the
/// live market before it reaches Risk Control.
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    pub bid: Price,
    pub ask: Price,
}

/// Exchange-reported lifecycle status of one order, as returned by
/// [`crate::ExchangeAdapter::get_order`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderStatusKind {
    Open,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatusKind {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatusKind::Filled | OrderStatusKind::Canceled | OrderStatusKind::Rejected
        )
    }
}

/// Current fill state of one order, polled until terminal before the
/// engine acts on a fill.
#[derive(Clone, Copy, Debug)]
pub struct OrderStatusReport {
    pub status: OrderStatusKind,
    pub filled_quantity: Qty,
    pub avg_fill_price: Price,
}

/// One exchange-reported open position, as returned by a position query
/// during reconciliation. Carries enough to adopt an untracked position
/// outright — the same inputs [`crate::engine::TradingEngine::adopt_position`]
/// already takes.
#[derive(Clone, Debug)]
pub struct ExchangePositionView {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub quantity: Qty,
    pub entry_price: Price,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Transition(#[from] crate::oms::TransitionError),
    #[error("no tracked order for client_order_id={0}")]
    UnknownOrder(String),
    #[error("exchange rejected the order: {0}")]
    Rejected(String),
    #[error("exchange submission failed after exhausting retries: {0}")]
    SubmissionFailed(String),
    #[error(transparent)]
    Domain(#[from] qte_domain::DomainError),
}

#[derive(Clone, Debug)]
pub struct SubmitRequest {
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: qte_domain::OrderType,
    pub quantity: Qty,
    pub price: Option<Price>,
    pub reduce_only: bool,
}

#[derive(Clone, Debug)]
pub struct SubmitResponse {
    pub exchange_order_id: String,
}

#[derive(Clone, Debug)]
pub struct CancelRequest {
    pub exchange_order_id: String,
    pub symbol: Symbol,
}

/// Derive a stable `clientOrderId = hash(strategyId|symbol|side|bucketedTime)`
///. Retries of the same logical signal within the same
/// time bucket collapse onto the same id, so a submit that times out after
/// the exchange actually received it is never resubmitted as a duplicate.
pub fn derive_client_order_id(
    strategy_id: &str,
    symbol: &Symbol,
    side: Side,
    bucketed_time: chrono::DateTime<chrono::Utc>,
) -> String {
    let side_str = match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    };
    let raw = format!(
        "{strategy_id}|{}|{side_str}|{}",
        symbol.pair_string(),
        bucketed_time.timestamp()
    );
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}

/// Round `time` down to the start of its minute — the bucket width used by
/// [`derive_client_order_id`], matching the candle-close cadence signals are
/// produced on.
pub fn bucket_time(time: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::Timelike;
    time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time)
}

/// Re-price a signal against the current ticker: BUY
/// takes the ask, SELL takes the bid, and the stop is shifted by the same
/// delta so the original stop distance is preserved.
pub fn reprice_entry(side: Side, signal_price: Price, stop_loss: Price, ticker: Ticker) -> (Price, Price) {
    let new_price = match side {
        Side::Buy => ticker.ask,
        Side::Sell => ticker.bid,
    };
    let delta = new_price - signal_price;
    (new_price, stop_loss + delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_inputs_in_same_bucket_produce_same_id() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let t = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 10).unwrap();
        let t2 = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 45).unwrap();
        let a = derive_client_order_id("s1", &symbol, Side::Buy, bucket_time(t));
        let b = derive_client_order_id("s1", &symbol, Side::Buy, bucket_time(t2));
        assert_eq!(a, b);
    }

    #[test]
    fn different_strategy_produces_different_id() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let t = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let a = derive_client_order_id("s1", &symbol, Side::Buy, t);
        let b = derive_client_order_id("s2", &symbol, Side::Buy, t);
        assert_ne!(a, b);
    }

    #[test]
    fn reprice_preserves_stop_distance() {
        use rust_decimal_macros::dec;
        let ticker = Ticker { bid: Price::new(dec!(99.5)), ask: Price::new(dec!(100.5)) };
        let (price, stop) = reprice_entry(Side::Buy, Price::new(dec!(100)), Price::new(dec!(95)), ticker);
        assert_eq!(price, Price::new(dec!(100.5)));
        assert_eq!(stop, Price::new(dec!(95.5)));

        let (price, stop) = reprice_entry(Side::Sell, Price::new(dec!(100)), Price::new(dec!(105)), ticker);
        assert_eq!(price, Price::new(dec!(99.5)));
        assert_eq!(stop, Price::new(dec!(104.5)));
    }

    #[test]
    fn different_minute_bucket_produces_different_id() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let t1 = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let t2 = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 1, 0).unwrap();
        let a = derive_client_order_id("s1", &symbol, Side::Buy, bucket_time(t1));
        let b = derive_client_order_id("s1", &symbol, Side::Buy, bucket_time(t2));
        assert_ne!(a, b);
    }
}
