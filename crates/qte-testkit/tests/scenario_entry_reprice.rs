//! Concrete scenario 5: signal BUY @100, stop 90. Ticker
//! returns bid=100, ask=101. With reprice enabled, the order handed to
//! risk control has entry 101 and stop 91 — the original 10-wide stop
//! distance is preserved against the repriced entry.

use qte_domain::{Price, Qty, Side, Signal, SignalType, Symbol};
use qte_exchange::PaperExchange;
use qte_execution::TradingEngine;
use qte_risk::{AccountState, RiskConfig, RiskEngine, RiskState, RiskVerdict};
use rust_decimal_macros::dec;
use std::collections::HashMap;

#[tokio::test]
async fn repriced_entry_preserves_stop_distance_and_flows_to_risk() {
    let exchange = PaperExchange::new();
    let symbol = Symbol::parse("BTC-USDT").unwrap();
    exchange.set_ticker(&symbol, Price::new(dec!(100)), Price::new(dec!(101)));
    let engine = TradingEngine::new(exchange);

    let (price, stop, ticker_failed) = engine
        .reprice_for_entry(&symbol, Side::Buy, Price::new(dec!(100)), Price::new(dec!(90)), chrono::Utc::now())
        .await;
    assert!(!ticker_failed);
    assert_eq!(price, Price::new(dec!(101)));
    assert_eq!(stop, Price::new(dec!(91)));

    let risk = RiskEngine::new(RiskConfig::conservative_defaults());
    let state = RiskState::new(Price::new(dec!(10000)));
    let account = AccountState { equity: Price::new(dec!(10000)), available_balance: Price::new(dec!(10000)), unrealized_pnl: Price::ZERO };
    let signal = Signal {
        strategy_id: "s1".into(),
        symbol: symbol.clone(),
        signal_type: SignalType::EntryLong,
        suggested_price: price,
        suggested_quantity: Qty::ZERO,
        stop_loss: stop,
        take_profit: None,
        reason: "scenario_5".into(),
    };
    let verdict = risk.evaluate(&signal, &state, &account, &HashMap::new());
    match verdict {
        RiskVerdict::Approved(approved) => {
            assert_eq!(approved.price, Price::new(dec!(101)));
            assert_eq!(approved.stop_loss, Price::new(dec!(91)));
        }
        other => panic!("expected approval, got {other:?}"),
    }
}
