//! Result-metric computation from a completed run's equity curve and
//! closed-trade list.
//!
//! Sharpe needs a variance/square-root step with no clean fixed-point
//! analog, so this module drops to `f64` for exactly that step despite
//! using `Decimal` everywhere else.

use qte_domain::{ClosedTrade, Price};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::types::{BacktestReport, EquityPoint};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn compute_report(
    initial_equity: Price,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<ClosedTrade>,
) -> BacktestReport {
    let final_equity = equity_curve.last().map(|p| p.equity).unwrap_or(initial_equity);

    let total_return_pct = percent_change(initial_equity.raw(), final_equity.raw());
    let annualized_return_pct = annualize(total_return_pct, &equity_curve);
    let max_drawdown_pct = max_drawdown(&equity_curve);
    let sharpe_ratio = sharpe(&equity_curve);

    let wins: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.is_win())
        .map(|t| t.net_pnl().raw())
        .collect();
    let losses: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.is_loss())
        .map(|t| t.net_pnl().raw().abs())
        .collect();

    let win_count = wins.len();
    let loss_count = losses.len();
    let trade_count = trades.len();

    let win_rate = if trade_count == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(win_count as u64) / Decimal::from(trade_count as u64)).round_dp(4)
    };

    let gross_win: Decimal = wins.iter().sum();
    let gross_loss: Decimal = losses.iter().sum();
    let profit_factor = if gross_loss.is_zero() {
        None
    } else {
        Some((gross_win / gross_loss).round_dp(4))
    };

    let avg_win = mean(&wins).round_dp(2);
    let avg_loss = mean(&losses).round_dp(2);
    let largest_win = wins.iter().copied().fold(Decimal::ZERO, Decimal::max);
    let largest_loss = losses.iter().copied().fold(Decimal::ZERO, Decimal::max);

    BacktestReport {
        total_return_pct,
        annualized_return_pct,
        max_drawdown_pct,
        sharpe_ratio,
        trade_count,
        wins: win_count,
        losses: loss_count,
        win_rate,
        profit_factor,
        avg_win,
        avg_loss,
        largest_win: Price::new(largest_win),
        largest_loss: Price::new(largest_loss),
        equity_curve,
        trades,
    }
}

fn mean(xs: &[Decimal]) -> Decimal {
    if xs.is_empty() {
        return Decimal::ZERO;
    }
    xs.iter().sum::<Decimal>() / Decimal::from(xs.len() as u64)
}

fn percent_change(start: Decimal, end: Decimal) -> Decimal {
    if start.is_zero() {
        return Decimal::ZERO;
    }
    ((end - start) / start * Decimal::ONE_HUNDRED).round_dp(4)
}

/// Linear days-to-365 projection of `total_return_pct`.
fn annualize(total_return_pct: Decimal, eq: &[EquityPoint]) -> Decimal {
    let (Some(first), Some(last)) = (eq.first(), eq.last()) else {
        return Decimal::ZERO;
    };
    let days = (last.time - first.time).num_seconds() as f64 / 86_400.0;
    if days <= 0.0 {
        return Decimal::ZERO;
    }
    let factor = Decimal::from_f64(365.0 / days).unwrap_or(Decimal::ZERO);
    (total_return_pct * factor).round_dp(4)
}

fn max_drawdown(eq: &[EquityPoint]) -> Decimal {
    let Some(first) = eq.first() else {
        return Decimal::ZERO;
    };
    let mut peak = first.equity.raw();
    let mut worst = Decimal::ZERO;
    for point in eq {
        let e = point.equity.raw();
        if e > peak {
            peak = e;
        }
        if !peak.is_zero() {
            let dd = (peak - e) / peak * Decimal::ONE_HUNDRED;
            if dd > worst {
                worst = dd;
            }
        }
    }
    worst.round_dp(4)
}

/// Per-bar return mean/std scaled by `sqrt(252)`.
fn sharpe(eq: &[EquityPoint]) -> Decimal {
    if eq.len() < 2 {
        return Decimal::ZERO;
    }
    let returns: Vec<f64> = eq
        .windows(2)
        .filter_map(|w| {
            let a = w[0].equity.raw().to_f64()?;
            let b = w[1].equity.raw().to_f64()?;
            if a == 0.0 {
                None
            } else {
                Some((b - a) / a)
            }
        })
        .collect();
    if returns.is_empty() {
        return Decimal::ZERO;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std = variance.sqrt();
    if std <= 0.0 {
        return Decimal::ZERO;
    }
    let ratio = (mean / std) * TRADING_DAYS_PER_YEAR.sqrt();
    Decimal::from_f64(ratio).map(|d| d.round_dp(4)).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use qte_domain::{ExitReason, PositionSide, Symbol};
    use rust_decimal_macros::dec;

    fn point(day: i64, equity: Decimal) -> EquityPoint {
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        EquityPoint { time: t0 + chrono::Duration::days(day), equity: Price::new(equity) }
    }

    fn trade(net: &str) -> ClosedTrade {
        let t = Utc::now();
        let gross = Price::new(net.parse().unwrap());
        ClosedTrade::new(
            Symbol::parse("BTC-USDT").unwrap(),
            PositionSide::Long,
            Price::new(dec!(100)),
            Price::new(dec!(100)),
            qte_domain::Qty::new(dec!(1)),
            gross,
            Price::ZERO,
            t,
            t,
            "s1".into(),
            ExitReason::StrategyExit,
        )
    }

    #[test]
    fn flat_equity_curve_has_zero_return_and_drawdown() {
        let eq = vec![point(0, dec!(10000)), point(1, dec!(10000))];
        let report = compute_report(Price::new(dec!(10000)), eq, vec![]);
        assert_eq!(report.total_return_pct, Decimal::ZERO);
        assert_eq!(report.max_drawdown_pct, Decimal::ZERO);
    }

    #[test]
    fn drawdown_tracks_worst_peak_to_trough_drop() {
        let eq = vec![point(0, dec!(10000)), point(1, dec!(12000)), point(2, dec!(9000)), point(3, dec!(11000))];
        let report = compute_report(Price::new(dec!(10000)), eq, vec![]);
        // (12000 - 9000) / 12000 == 25%
        assert_eq!(report.max_drawdown_pct, dec!(25.0000));
    }

    #[test]
    fn profit_factor_is_gross_win_over_gross_loss() {
        let trades = vec![trade("100"), trade("-50")];
        let eq = vec![point(0, dec!(10000)), point(1, dec!(10050))];
        let report = compute_report(Price::new(dec!(10000)), eq, trades);
        assert_eq!(report.profit_factor, Some(dec!(2.0000)));
        assert_eq!(report.wins, 1);
        assert_eq!(report.losses, 1);
    }

    #[test]
    fn all_winning_trades_yields_no_profit_factor() {
        let trades = vec![trade("100"), trade("50")];
        let eq = vec![point(0, dec!(10000))];
        let report = compute_report(Price::new(dec!(10000)), eq, trades);
        assert_eq!(report.profit_factor, None);
    }
}
