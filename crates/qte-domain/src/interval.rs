//! Candle interval.

use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A K-line interval. The traded set is restricted to 1m/5m, but the
/// enum carries the full common ladder so indicator/backtest code that
/// resamples (`MarketDataManager` building a 5m view from 1m ticks) has
/// somewhere to land.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    /// Length of one candle, in minutes.
    pub const fn minutes(self) -> i64 {
        match self {
            Interval::OneMinute => 1,
            Interval::FiveMinutes => 5,
            Interval::FifteenMinutes => 15,
            Interval::OneHour => 60,
            Interval::FourHours => 240,
            Interval::OneDay => 1440,
        }
    }

    /// Canonical wire string, matching the `#[serde(rename)]` tags above.
    pub const fn as_str(self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    /// `true` if `source` evenly divides `self`, i.e. `self` can be built by
    /// aggregating whole candles of `source` (a 5m target can be built from
    /// 1m source candles; a 1h target cannot be built from 15m... it can —
    /// 60 % 15 == 0 — but a 5m target cannot be built from 1h source).
    pub fn divisible_from(self, source: Interval) -> bool {
        source.minutes() <= self.minutes() && self.minutes() % source.minutes() == 0
    }

    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            other => Err(DomainError::invalid_argument(format!(
                "unknown interval: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
