//! Concrete scenario 7: the same signal is retried after a
//! timeout with an unchanged `clientOrderId`; the exchange returns the
//! existing order and the engine proceeds as if the first submission had
//! succeeded — no duplicate order, no error on the retry.

use qte_exchange::PaperExchange;
use qte_execution::TradingEngine;
use qte_domain::{Price, Qty, Side, Symbol};
use qte_risk::ApprovedOrder;
use rust_decimal_macros::dec;

fn approved() -> ApprovedOrder {
    ApprovedOrder { quantity: Qty::new(dec!(1)), price: Price::new(dec!(100)), stop_loss: Price::new(dec!(95)), take_profit: None, reduce_only: false }
}

#[tokio::test]
async fn retried_submit_with_the_same_client_order_id_is_not_double_applied() {
    let exchange = PaperExchange::new();
    let mut engine = TradingEngine::new(exchange);
    let symbol = Symbol::parse("BTC-USDT").unwrap();
    let now = chrono::Utc::now();

    engine.submit_entry("s1", &symbol, Side::Buy, &approved(), 1, now).await.unwrap();
    let position_after_first = engine.tracked_position(&symbol).unwrap().clone();

    // Same strategy/symbol/side within the same minute bucket as `now`:
    // `derive_client_order_id` collapses this onto the same id the first
    // submission used (the retry the caller would issue after a timeout).
    engine.submit_entry("s1", &symbol, Side::Buy, &approved(), 1, now).await.unwrap();
    let position_after_retry = engine.tracked_position(&symbol).unwrap();

    assert_eq!(position_after_first.entry_price, position_after_retry.entry_price);
    assert_eq!(position_after_first.quantity, position_after_retry.quantity);
}
