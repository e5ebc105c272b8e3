//! Concrete scenario 4: health config `minSampleSize=5,
//! maxConsecutiveLosses=3`. Trade sequence W, L, L, L, L — the strategy
//! transitions to DISABLED after the 5th trade (sample size reaches 5
//! with a 4-long losing run, which only clears the 3-loss threshold once
//! there's enough sample to evaluate it).

use qte_domain::{ClosedTrade, ExitReason, Price, PositionSide, Qty, Symbol};
use qte_health::{HealthConfig, HealthState, HealthSupervisor};
use rust_decimal_macros::dec;

fn trade(net_pnl_positive: bool) -> ClosedTrade {
    let t = chrono::Utc::now();
    let (entry, exit) = if net_pnl_positive { (dec!(100), dec!(110)) } else { (dec!(100), dec!(90)) };
    ClosedTrade::new(
        Symbol::parse("BTC-USDT").unwrap(),
        PositionSide::Long,
        Price::new(entry),
        Price::new(exit),
        Qty::new(dec!(1)),
        Price::new(exit - entry),
        Price::ZERO,
        t,
        t,
        "strat-1".into(),
        ExitReason::StopLoss,
    )
}

#[test]
fn win_then_four_losses_disables_on_the_fifth_trade() {
    let sup = HealthSupervisor::new(10, HealthConfig::conservative_default());
    let sequence = [true, false, false, false, false];

    let mut last = HealthState::Enabled;
    for (i, is_win) in sequence.iter().enumerate() {
        last = sup.record_closed_trade("strat-1", trade(*is_win));
        if i < 4 {
            assert!(sup.is_strategy_enabled("strat-1"), "strategy disabled before the 5th trade (index {i})");
        }
    }

    assert_eq!(last, HealthState::Disabled);
    assert!(!sup.is_strategy_enabled("strat-1"));
}
