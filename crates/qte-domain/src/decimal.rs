//! Fixed-precision arithmetic types — price, quantity, percentage.
//!
//! # Motivation
//!
//! Every quantitative value in this system rounds differently:
//! - Prices carry 8 fractional digits and round half-up (exchange tick math).
//! - Quantities carry 3 fractional digits and round down / floor (never
//!   claim a fill size the exchange did not give us).
//! - Percentages carry 2 fractional digits and round half-up (display and
//!   threshold comparisons).
//!
//! Using a bare [`Decimal`] for all three lets a quantity accidentally be
//! compared against a price at the wrong scale with no compiler signal.
//! [`Price`], [`Qty`], and [`Percent`] wrap `Decimal` so the scale and
//! rounding mode are applied at construction and the type system keeps the
//! three kinds of value apart.
//!
//! # Construction
//!
//! Use [`Price::new`], [`Qty::new`], [`Percent::new`] for explicit,
//! quantizing construction. There is intentionally no blanket `From<Decimal>`
//! — callers must be deliberate about which scale a raw `Decimal` represents.
//!
//! # Retrieval
//!
//! Use `.raw()` to extract the underlying [`Decimal`] when crossing a crate
//! boundary that requires it (serialization, arithmetic libraries).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Fractional digits retained by [`Price`].
pub const PRICE_SCALE: u32 = 8;
/// Fractional digits retained by [`Qty`].
pub const QTY_SCALE: u32 = 3;
/// Fractional digits retained by [`Percent`].
pub const PERCENT_SCALE: u32 = 2;

macro_rules! decimal_newtype {
    ($name:ident, $scale:expr, $rounding:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Copy, Clone, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Decimal);

        impl $name {
            /// Zero at this type's scale.
            pub const ZERO: $name = $name(Decimal::ZERO);

            /// Construct from a raw `Decimal`, quantizing to this type's
            /// scale and rounding mode.
            #[inline]
            pub fn new(raw: Decimal) -> Self {
                $name(raw.round_dp_with_strategy($scale, $rounding))
            }

            /// Construct from an already-quantized `Decimal` without
            /// re-rounding. Callers must guarantee the scale is correct;
            /// used for values decoded from a format at the right scale.
            #[inline]
            pub const fn from_quantized(raw: Decimal) -> Self {
                $name(raw)
            }

            /// Extract the underlying `Decimal`.
            #[inline]
            pub const fn raw(self) -> Decimal {
                self.0
            }

            /// `true` if this value is strictly greater than zero.
            #[inline]
            pub fn is_positive(self) -> bool {
                self.0 > Decimal::ZERO
            }

            /// `true` if this value is strictly less than zero.
            #[inline]
            pub fn is_negative(self) -> bool {
                self.0 < Decimal::ZERO
            }

            /// `true` if this value is zero.
            #[inline]
            pub fn is_zero(self) -> bool {
                self.0 == Decimal::ZERO
            }

            /// Absolute value, re-quantized.
            #[inline]
            pub fn abs(self) -> Self {
                $name(self.0.abs())
            }

            /// Checked addition. `None` on internal `Decimal` overflow
            /// (128-bit mantissa exhausted), which in practice never
            /// happens for trading-sized values but must be handled
            /// explicitly rather than panicking in the hot path.
            #[inline]
            pub fn checked_add(self, rhs: Self) -> Option<Self> {
                self.0.checked_add(rhs.0).map($name)
            }

            /// Checked subtraction, see [`Self::checked_add`].
            #[inline]
            pub fn checked_sub(self, rhs: Self) -> Option<Self> {
                self.0.checked_sub(rhs.0).map($name)
            }
        }

        impl Add for $name {
            type Output = $name;
            #[inline]
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = $name;
            #[inline]
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl Neg for $name {
            type Output = $name;
            #[inline]
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

decimal_newtype!(
    Price,
    PRICE_SCALE,
    RoundingStrategy::MidpointAwayFromZero,
    "A price, quantized to 8 fractional digits, half-up rounding."
);
decimal_newtype!(
    Qty,
    QTY_SCALE,
    RoundingStrategy::ToZero,
    "A quantity, quantized to 3 fractional digits, rounded down (floor \
     toward zero — never overstate a fill or position size)."
);
decimal_newtype!(
    Percent,
    PERCENT_SCALE,
    RoundingStrategy::MidpointAwayFromZero,
    "A percentage, quantized to 2 fractional digits, half-up rounding."
);

impl Price {
    /// Multiply by a quantity, producing notional value at price scale.
    /// `None` only on the practically-unreachable internal overflow case.
    pub fn checked_mul_qty(self, qty: Qty) -> Option<Price> {
        self.0.checked_mul(qty.0).map(Price::new)
    }
}

impl Qty {
    /// Floor-divide a notional amount by this quantity, useful for
    /// position-sizing arithmetic (`risk_amount / stop_distance`).
    pub fn checked_div(self, rhs: Self) -> Option<Decimal> {
        if rhs.0.is_zero() {
            None
        } else {
            self.0.checked_div(rhs.0)
        }
    }
}
