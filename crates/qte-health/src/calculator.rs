//! Rolling expected-value tracker, keyed by strategy id.
//!
//! Each strategy gets a bounded FIFO of its last `window_size` closed
//! trades. `snapshot` recomputes win rate, average win/loss, rolling EV,
//! and the trailing consecutive-loss run from that window alone — nothing
//! is kept incrementally, so `restore_state` and a from-scratch replay of
//! the same trades always agree.

use qte_domain::ClosedTrade;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// Point-in-time read of a strategy's rolling window.
#[derive(Clone, Debug, PartialEq)]
pub struct RollingEvSnapshot {
    pub sample_size: usize,
    /// `wins / sampleSize`, quantized to 4 fractional digits.
    pub win_rate: Decimal,
    /// Mean of positive `netPnl` values, quantized to 2 fractional digits.
    pub avg_win: Decimal,
    /// Mean of `|netPnl|` over negative values, quantized to 2 fractional digits.
    pub avg_loss: Decimal,
    /// `winRate * avgWin - (1 - winRate) * avgLoss`, quantized to 2 digits.
    pub rolling_ev: Decimal,
    /// Length of the trailing run of losing trades ending at the window's last trade.
    pub consecutive_losses: u32,
}

impl RollingEvSnapshot {
    fn empty() -> Self {
        RollingEvSnapshot {
            sample_size: 0,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            rolling_ev: Decimal::ZERO,
            consecutive_losses: 0,
        }
    }
}

/// A single strategy's bounded trade window.
#[derive(Clone, Debug)]
struct StrategyWindow {
    window_size: usize,
    trades: VecDeque<ClosedTrade>,
}

impl StrategyWindow {
    fn new(window_size: usize) -> Self {
        StrategyWindow { window_size, trades: VecDeque::with_capacity(window_size) }
    }

    fn push(&mut self, trade: ClosedTrade) {
        if self.trades.len() == self.window_size {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
    }

    fn snapshot(&self) -> RollingEvSnapshot {
        let sample_size = self.trades.len();
        if sample_size == 0 {
            return RollingEvSnapshot::empty();
        }

        let wins: Vec<Decimal> = self
            .trades
            .iter()
            .filter(|t| t.is_win())
            .map(|t| t.net_pnl().raw())
            .collect();
        let losses: Vec<Decimal> = self
            .trades
            .iter()
            .filter(|t| t.is_loss())
            .map(|t| t.net_pnl().raw().abs())
            .collect();

        let win_rate = (Decimal::from(wins.len()) / Decimal::from(sample_size)).round_dp(4);
        let avg_win = if wins.is_empty() {
            Decimal::ZERO
        } else {
            (wins.iter().sum::<Decimal>() / Decimal::from(wins.len())).round_dp(2)
        };
        let avg_loss = if losses.is_empty() {
            Decimal::ZERO
        } else {
            (losses.iter().sum::<Decimal>() / Decimal::from(losses.len())).round_dp(2)
        };
        let rolling_ev =
            (win_rate * avg_win - (Decimal::ONE - win_rate) * avg_loss).round_dp(2);

        let mut consecutive_losses = 0u32;
        for trade in self.trades.iter().rev() {
            if trade.is_loss() {
                consecutive_losses += 1;
            } else {
                break;
            }
        }

        RollingEvSnapshot { sample_size, win_rate, avg_win, avg_loss, rolling_ev, consecutive_losses }
    }
}

/// Owns one [`StrategyWindow`] per strategy id.
///
/// Callers that share this across tasks are expected to guard it with a
/// single mutex, held only for the duration of one `record_trade` or
/// `snapshot` call.
#[derive(Clone, Debug, Default)]
pub struct RollingEvCalculator {
    window_size: usize,
    windows: HashMap<String, StrategyWindow>,
}

impl RollingEvCalculator {
    pub fn new(window_size: usize) -> Self {
        RollingEvCalculator { window_size, windows: HashMap::new() }
    }

    pub fn record_trade(&mut self, strategy_id: &str, trade: ClosedTrade) {
        self.windows
            .entry(strategy_id.to_string())
            .or_insert_with(|| StrategyWindow::new(self.window_size))
            .push(trade);
    }

    pub fn snapshot(&self, strategy_id: &str) -> RollingEvSnapshot {
        self.windows
            .get(strategy_id)
            .map(StrategyWindow::snapshot)
            .unwrap_or_else(RollingEvSnapshot::empty)
    }

    /// Oldest-first trades currently held in a strategy's window, for
    /// persistence. Feeding this back through [`Self::restore_state`]
    /// reproduces the identical window.
    pub fn trades(&self, strategy_id: &str) -> Vec<ClosedTrade> {
        self.windows
            .get(strategy_id)
            .map(|w| w.trades.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Replace a strategy's window wholesale, e.g. from persisted state on
    /// startup. `trades` is taken oldest-first; only the trailing
    /// `window_size` entries are kept.
    pub fn restore_state(&mut self, strategy_id: &str, trades: Vec<ClosedTrade>) {
        let mut window = StrategyWindow::new(self.window_size);
        for trade in trades {
            window.push(trade);
        }
        self.windows.insert(strategy_id.to_string(), window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_domain::{ExitReason, Price, PositionSide, Qty, Symbol};
    use rust_decimal_macros::dec;

    fn trade(net: &str) -> ClosedTrade {
        let net: Decimal = net.parse().unwrap();
        let (gross, fee) = if net.is_sign_negative() {
            (Price::new(Decimal::ZERO), Price::new(-net))
        } else {
            (Price::new(net), Price::new(Decimal::ZERO))
        };
        let t = chrono::Utc::now();
        ClosedTrade::new(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Price::new(dec!(100)),
            Qty::new(dec!(1)),
            gross,
            fee,
            t,
            t,
            "strat-1".into(),
            ExitReason::StrategyExit,
        )
    }

    #[test]
    fn empty_window_has_zero_sample() {
        let calc = RollingEvCalculator::new(5);
        assert_eq!(calc.snapshot("strat-1").sample_size, 0);
    }

    #[test]
    fn window_is_bounded_by_window_size() {
        let mut calc = RollingEvCalculator::new(3);
        for net in ["1", "2", "3", "4"] {
            calc.record_trade("strat-1", trade(net));
        }
        assert_eq!(calc.snapshot("strat-1").sample_size, 3);
    }

    #[test]
    fn consecutive_losses_counts_trailing_run_only() {
        let mut calc = RollingEvCalculator::new(5);
        for net in ["1", "-1", "-1", "-1"] {
            calc.record_trade("strat-1", trade(net));
        }
        assert_eq!(calc.snapshot("strat-1").consecutive_losses, 3);
    }

    #[test]
    fn a_win_resets_the_consecutive_loss_run() {
        let mut calc = RollingEvCalculator::new(5);
        for net in ["-1", "-1", "1"] {
            calc.record_trade("strat-1", trade(net));
        }
        assert_eq!(calc.snapshot("strat-1").consecutive_losses, 0);
    }

    #[test]
    fn restore_state_matches_fresh_replay() {
        let trades: Vec<ClosedTrade> = ["1", "-2", "3", "-1"].iter().map(|n| trade(n)).collect();

        let mut replayed = RollingEvCalculator::new(4);
        for t in trades.clone() {
            replayed.record_trade("strat-1", t);
        }

        let mut restored = RollingEvCalculator::new(4);
        restored.restore_state("strat-1", trades);

        assert_eq!(replayed.snapshot("strat-1"), restored.snapshot("strat-1"));
    }

    #[test]
    fn rolling_ev_matches_formula() {
        let mut calc = RollingEvCalculator::new(4);
        for net in ["10", "10", "-5", "-5"] {
            calc.record_trade("strat-1", trade(net));
        }
        let snap = calc.snapshot("strat-1");
        // winRate=0.5, avgWin=10, avgLoss=5 -> ev = 0.5*10 - 0.5*5 = 2.50
        assert_eq!(snap.rolling_ev, dec!(2.50));
    }
}
