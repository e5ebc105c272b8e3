use qte_domain::{DomainError, DomainResult, Price};

/// Simple moving average. For `prices.len() == L >= n`, returns length
/// `L - n + 1`; element `i` is the mean of `prices[i..i+n]`.
pub fn sma(prices: &[Price], n: usize) -> DomainResult<Vec<Price>> {
    if n == 0 {
        return Err(DomainError::invalid_argument("SMA period must be > 0"));
    }
    if prices.len() < n {
        return Err(DomainError::invalid_argument(format!(
            "SMA({n}) needs at least {n} prices, got {}",
            prices.len()
        )));
    }
    let mut out = Vec::with_capacity(prices.len() - n + 1);
    let mut window_sum = prices[..n].iter().fold(Price::ZERO, |acc, p| acc + *p);
    out.push(Price::new(window_sum.raw() / rust_decimal::Decimal::from(n)));
    for i in n..prices.len() {
        window_sum = window_sum - prices[i - n] + prices[i];
        out.push(Price::new(window_sum.raw() / rust_decimal::Decimal::from(n)));
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
    fn sma_of_constant_series_is_constant() {
        let p = prices(&["10", "10", "10", "10"]);
        let out = sma(&p, 2).unwrap();
        assert_eq!(out.len(), 3);
        for v in out {
            assert_eq!(v.raw(), dec!(10.00000000));
        }
    }

    #[test]
    fn sma_length_is_l_minus_n_plus_one() {
        let p = prices(&["1", "2", "3", "4", "5"]);
        let out = sma(&p, 3).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].raw(), dec!(2.00000000));
        assert_eq!(out[1].raw(), dec!(3.00000000));
        assert_eq!(out[2].raw(), dec!(4.00000000));
    }

    #[test]
    fn zero_period_is_invalid() {
        let p = prices(&["1", "2"]);
        assert!(sma(&p, 0).is_err());
    }

    #[test]
    fn insufficient_data_is_invalid() {
        let p = prices(&["1", "2"]);
        assert!(sma(&p, 3).is_err());
    }
}
