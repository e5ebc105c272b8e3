use crate::sma::sma;
use qte_domain::{DomainError, DomainResult, Price};
use rust_decimal::Decimal;

/// Exponential moving average. Seed = SMA(n) over the first window;
/// thereafter `ema_t = close_t*k + ema_{t-1}*(1-k)`, `k = 2/(n+1)`. Same
/// length semantics as [`sma`].
pub fn ema(prices: &[Price], n: usize) -> DomainResult<Vec<Price>> {
    if n == 0 {
        return Err(DomainError::invalid_argument("EMA period must be > 0"));
    }
    let seed = sma(prices, n)?;
    let k = Decimal::from(2) / Decimal::from(n + 1);
    let one_minus_k = Decimal::ONE - k;

    let mut out = Vec::with_capacity(seed.len());
    let mut prev = seed[0];
    out.push(prev);
    for close in &prices[n..] {
        let next = Price::new(close.raw() * k + prev.raw() * one_minus_k);
        out.push(next);
        prev = next;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(vals: &[&str]) -> Vec<Price> {
        vals.iter().map(|v| Price::new(v.parse().unwrap())).collect()
    }

    #[test]
    fn ema_of_constant_series_equals_the_constant() {
        let p = prices(&["10", "10", "10", "10", "10"]);
        let out = ema(&p, 3).unwrap();
        for v in out {
            assert_eq!(v.raw(), dec!(10.00000000));
        }
    }

    #[test]
    fn ema_length_matches_sma_length() {
        let p = prices(&["1", "2", "3", "4", "5", "6"]);
        let out = ema(&p, 3).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn ema_first_value_equals_seed_sma() {
        let p = prices(&["1", "2", "3"]);
        let out = ema(&p, 3).unwrap();
        assert_eq!(out[0].raw(), dec!(2.00000000));
    }
}
