//! OHLCV candle.

use crate::decimal::{Price, Qty};
use crate::error::{DomainError, DomainResult};
use crate::interval::Interval;
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable OHLCV candle.
///
/// Construction via [`KLine::new`] enforces the invariants the rest of the
/// system relies on without re-checking: `low <= min(open, close) <=
/// max(open, close) <= high`, and `closeTime - openTime == interval`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KLine {
    pub symbol: Symbol,
    pub interval: Interval,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Qty,
    pub quote_volume: Price,
    pub trades: u64,
    /// `false` for the still-forming candle at the head of a live feed.
    /// `MarketDataManager` never fans this one out to strategies — only a
    /// candle with `is_complete == true` triggers `analyze`.
    pub is_complete: bool,
}

impl KLine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        interval: Interval,
        open_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Qty,
        quote_volume: Price,
        trades: u64,
        is_complete: bool,
    ) -> DomainResult<Self> {
        let body_low = open.min(close);
        let body_high = open.max(close);
        if low > body_low {
            return Err(DomainError::invariant_violation(format!(
                "low {low} must be <= min(open, close) {body_low}"
            )));
        }
        if high < body_high {
            return Err(DomainError::invariant_violation(format!(
                "high {high} must be >= max(open, close) {body_high}"
            )));
        }
        let expected_span = chrono::Duration::minutes(interval.minutes());
        if close_time - open_time != expected_span {
            return Err(DomainError::invariant_violation(format!(
                "closeTime - openTime must equal interval length ({expected_span}), got {}",
                close_time - open_time
            )));
        }
        Ok(KLine {
            symbol,
            interval,
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
            quote_volume,
            trades,
            is_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(open: &str, high: &str, low: &str, close: &str) -> DomainResult<KLine> {
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        KLine::new(
            Symbol::parse("BTC-USDT").unwrap(),
            Interval::OneMinute,
            t0,
            t0 + chrono::Duration::minutes(1),
            Price::new(open.parse().unwrap()),
            Price::new(high.parse().unwrap()),
            Price::new(low.parse().unwrap()),
            Price::new(close.parse().unwrap()),
            Qty::new(dec!(1)),
            Price::new(dec!(100)),
            10,
            true,
        )
    }

    #[test]
    fn accepts_well_formed_candle() {
        assert!(bar("100", "105", "99", "103").is_ok());
    }

    #[test]
    fn rejects_low_above_body() {
        assert!(bar("100", "105", "101", "103").is_err());
    }

    #[test]
    fn rejects_high_below_body() {
        assert!(bar("100", "102", "99", "103").is_err());
    }

    #[test]
    fn rejects_wrong_span() {
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let err = KLine::new(
            Symbol::parse("BTC-USDT").unwrap(),
            Interval::OneMinute,
            t0,
            t0 + chrono::Duration::minutes(5),
            Price::new(dec!(100)),
            Price::new(dec!(105)),
            Price::new(dec!(99)),
            Price::new(dec!(103)),
            Qty::new(dec!(1)),
            Price::new(dec!(100)),
            1,
            true,
        );
        assert!(err.is_err());
    }
}
