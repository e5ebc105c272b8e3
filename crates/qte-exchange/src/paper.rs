//! Deterministic in-memory exchange simulator.
//!
//! Design decisions, kept intentionally simple and deterministic:
//! - `exchange_order_id` is exactly `client_order_id` — no separate id space.
//! - Submit is idempotent: resubmitting the same `client_order_id` returns
//!   the existing order rather than creating a duplicate.
//! - No randomness, no wall-clock reads. Used by the backtest engine and by
//!   integration tests that need a stand-in for a real exchange.

use async_trait::async_trait;
use qte_domain::{OrderType, Price, Qty};
use qte_execution::{
    CancelRequest, ExchangeAdapter, ExchangeError, OrderStatusKind, OrderStatusReport, SubmitRequest,
    SubmitResponse, Ticker,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PaperOrderStatus {
    Open,
    Filled,
    Canceled,
    Rejected,
}

impl From<PaperOrderStatus> for OrderStatusKind {
    fn from(s: PaperOrderStatus) -> Self {
        match s {
            PaperOrderStatus::Open => OrderStatusKind::Open,
            PaperOrderStatus::Filled => OrderStatusKind::Filled,
            PaperOrderStatus::Canceled => OrderStatusKind::Canceled,
            PaperOrderStatus::Rejected => OrderStatusKind::Rejected,
        }
    }
}

#[derive(Clone, Debug)]
struct PaperOrder {
    status: PaperOrderStatus,
    filled_quantity: Qty,
    avg_fill_price: Price,
}

#[derive(Debug, Default)]
struct PaperExchangeState {
    orders: BTreeMap<String, PaperOrder>,
    tickers: BTreeMap<String, Ticker>,
}

/// A plain in-memory order book behind a mutex, implementing
/// [`ExchangeAdapter`] directly. No randomness, nothing fabricated —
/// fills and tickers only ever reflect what a caller explicitly seeded.
#[derive(Debug, Default)]
pub struct PaperExchange {
    state: Mutex<PaperExchangeState>,
}

impl PaperExchange {
    pub fn new() -> Self {
        PaperExchange { state: Mutex::new(PaperExchangeState::default()) }
    }

    pub fn is_open(&self, client_order_id: &str) -> bool {
        self.state
            .lock()
            .expect("paper exchange mutex poisoned")
            .orders
            .get(client_order_id)
            .map(|o| o.status == PaperOrderStatus::Open)
            .unwrap_or(false)
    }

    /// Seed the ticker `fetch_ticker` returns for `symbol`. Until seeded,
    /// `fetch_ticker` errors — there is no real market-data feed behind
    /// this simulator, so callers exercising entry reprice must set one
    /// explicitly rather than receive a silently fabricated price.
    pub fn set_ticker(&self, symbol: &qte_domain::Symbol, bid: qte_domain::Price, ask: qte_domain::Price) {
        self.state
            .lock()
            .expect("paper exchange mutex poisoned")
            .tickers
            .insert(symbol.pair_string(), Ticker { bid, ask });
    }
}

#[async_trait]
impl ExchangeAdapter for PaperExchange {
    async fn submit(&self, req: SubmitRequest) -> Result<SubmitResponse, ExchangeError> {
        let mut state = self.state.lock().expect("paper exchange mutex poisoned");
        // A Market order fills synchronously at its (already repriced)
        // quantity/price — there is no order book here to walk. StopMarket
        // orders have nothing to trigger them in this simulator and stay
        // OPEN until canceled.
        state.orders.entry(req.client_order_id.clone()).or_insert_with(|| match req.order_type {
            OrderType::Market => {
                PaperOrder { status: PaperOrderStatus::Filled, filled_quantity: req.quantity, avg_fill_price: req.price.unwrap_or(Price::ZERO) }
            }
            OrderType::Limit | OrderType::StopMarket => {
                PaperOrder { status: PaperOrderStatus::Open, filled_quantity: Qty::ZERO, avg_fill_price: Price::ZERO }
            }
        });
        Ok(SubmitResponse { exchange_order_id: req.client_order_id })
    }

    async fn cancel(&self, req: CancelRequest) -> Result<(), ExchangeError> {
        let mut state = self.state.lock().expect("paper exchange mutex poisoned");
        match state.orders.get_mut(&req.exchange_order_id) {
            Some(order) => {
                order.status = PaperOrderStatus::Canceled;
                Ok(())
            }
            None => Err(ExchangeError::Rejected(format!(
                "no such order on paper exchange: {}",
                req.exchange_order_id
            ))),
        }
    }

    async fn fetch_ticker(&self, symbol: &qte_domain::Symbol) -> Result<Ticker, ExchangeError> {
        let state = self.state.lock().expect("paper exchange mutex poisoned");
        state
            .tickers
            .get(&symbol.pair_string())
            .copied()
            .ok_or_else(|| ExchangeError::TransientNetwork(format!("no ticker seeded for {}", symbol.pair_string())))
    }

    async fn get_order(&self, exchange_order_id: &str, _symbol: &qte_domain::Symbol) -> Result<OrderStatusReport, ExchangeError> {
        let state = self.state.lock().expect("paper exchange mutex poisoned");
        let order = state
            .orders
            .get(exchange_order_id)
            .ok_or_else(|| ExchangeError::Rejected(format!("no such order on paper exchange: {exchange_order_id}")))?;
        Ok(OrderStatusReport {
            status: order.status.into(),
            filled_quantity: order.filled_quantity,
            avg_fill_price: order.avg_fill_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{OrderType, Qty, Side, Symbol};
    use rust_decimal_macros::dec;

    fn req(client_order_id: &str) -> SubmitRequest {
        SubmitRequest {
            client_order_id: client_order_id.to_string(),
            symbol: Symbol::parse("BTC-USDT").unwrap(),
            side: Side::Buy,
            order_type: OrderType::Market,
            quantity: Qty::new(dec!(1)),
            price: Some(qte_domain::Price::new(dec!(100))),
            reduce_only: false,
        }
    }

    fn stop_req(client_order_id: &str) -> SubmitRequest {
        SubmitRequest { order_type: OrderType::StopMarket, reduce_only: true, ..req(client_order_id) }
    }

    #[tokio::test]
    async fn market_order_fills_immediately_on_submit() {
        let exchange = PaperExchange::new();
        let resp = exchange.submit(req("cid-1")).await.unwrap();
        assert_eq!(resp.exchange_order_id, "cid-1");
        assert!(!exchange.is_open("cid-1"));
        let report = exchange.get_order("cid-1", &Symbol::parse("BTC-USDT").unwrap()).await.unwrap();
        assert_eq!(report.status, OrderStatusKind::Filled);
        assert_eq!(report.filled_quantity, Qty::new(dec!(1)));
        assert_eq!(report.avg_fill_price, qte_domain::Price::new(dec!(100)));
    }

    #[tokio::test]
    async fn stop_order_stays_open_until_canceled() {
        let exchange = PaperExchange::new();
        exchange.submit(stop_req("cid-1")).await.unwrap();
        assert!(exchange.is_open("cid-1"));
        let report = exchange.get_order("cid-1", &Symbol::parse("BTC-USDT").unwrap()).await.unwrap();
        assert_eq!(report.status, OrderStatusKind::Open);
    }

    #[tokio::test]
    async fn resubmitting_the_same_client_order_id_is_idempotent() {
        let exchange = PaperExchange::new();
        exchange.submit(stop_req("cid-1")).await.unwrap();
        exchange.submit(stop_req("cid-1")).await.unwrap();
        let state = exchange.state.lock().unwrap();
        assert_eq!(state.orders.len(), 1);
    }

    #[tokio::test]
    async fn cancel_closes_a_known_order() {
        let exchange = PaperExchange::new();
        exchange.submit(stop_req("cid-1")).await.unwrap();
        exchange
            .cancel(CancelRequest { exchange_order_id: "cid-1".into(), symbol: Symbol::parse("BTC-USDT").unwrap() })
            .await
            .unwrap();
        assert!(!exchange.is_open("cid-1"));
        let report = exchange.get_order("cid-1", &Symbol::parse("BTC-USDT").unwrap()).await.unwrap();
        assert_eq!(report.status, OrderStatusKind::Canceled);
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_is_rejected() {
        let exchange = PaperExchange::new();
        let result = exchange
            .cancel(CancelRequest { exchange_order_id: "missing".into(), symbol: Symbol::parse("BTC-USDT").unwrap() })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_ticker_errors_until_seeded() {
        let exchange = PaperExchange::new();
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        assert!(exchange.fetch_ticker(&symbol).await.is_err());

        exchange.set_ticker(&symbol, qte_domain::Price::new(dec!(99.5)), qte_domain::Price::new(dec!(100.5)));
        let ticker = exchange.fetch_ticker(&symbol).await.unwrap();
        assert_eq!(ticker.bid, qte_domain::Price::new(dec!(99.5)));
        assert_eq!(ticker.ask, qte_domain::Price::new(dec!(100.5)));
    }
}
