use crate::sma::sma;
use qte_domain::{DomainError, DomainResult, Price};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Bollinger Bands: middle = SMA(period), upper/lower = middle +/-
/// `std_dev_multiplier * population_stddev(window)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BollOutput {
    pub middle: Vec<Price>,
    pub upper: Vec<Price>,
    pub lower: Vec<Price>,
}

pub fn boll(prices: &[Price], period: usize, std_dev_multiplier: Decimal) -> DomainResult<BollOutput> {
    if period == 0 {
        return Err(DomainError::invalid_argument("BOLL period must be > 0"));
    }
    let middle = sma(prices, period)?;
    let period_dec = Decimal::from(period);

    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());
    for (i, mid) in middle.iter().enumerate() {
        let window = &prices[i..i + period];
        let variance: Decimal = window
            .iter()
            .map(|p| {
                let diff = p.raw() - mid.raw();
                diff * diff
            })
            .sum::<Decimal>()
            / period_dec;
        let std_dev = decimal_sqrt(variance);
        let band = Price::new(std_dev * std_dev_multiplier);
        upper.push(*mid + band);
        lower.push(*mid - band);
    }
    Ok(BollOutput { middle, upper, lower })
}

/// `Decimal` has no native `sqrt`; Newton's method converges in a handful
/// of iterations for the magnitudes this indicator sees (price variances).
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = Decimal::from_f64_retain(value.to_f64().unwrap_or(0.0).sqrt()).unwrap_or(value);
    for _ in 0..20 {
        if guess.is_zero() {
            break;
        }
        guess = (guess + value / guess) / Decimal::from(2);
    }
    guess
}
