use crate::ema::ema;
use qte_domain::{DomainError, DomainResult, Price};
use rust_decimal::Decimal;

/// MACD line, signal line, and histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<Decimal>,
    pub signal: Vec<Decimal>,
    pub histogram: Vec<Decimal>,
}

/// Standard MACD: `macd = ema(fast) - ema(slow)`, `signal = ema(macd,
/// signal_n)`, `histogram = macd - signal`. The three EMAs have different
/// warm-up lengths; this aligns them to the shortest common tail, matching
/// how a rolling strategy window only ever sees fully-warmed values.
pub fn macd(prices: &[Price], fast_n: usize, slow_n: usize, signal_n: usize) -> DomainResult<MacdOutput> {
    if fast_n == 0 || slow_n == 0 || signal_n == 0 {
        return Err(DomainError::invalid_argument(
            "MACD periods must all be > 0",
        ));
    }
    if slow_n <= fast_n {
        return Err(DomainError::invalid_argument(
            "MACD slow period must exceed the fast period",
        ));
    }
    let fast = ema(prices, fast_n)?;
    let slow = ema(prices, slow_n)?;

    // fast is longer than slow by (slow_n - fast_n); align tails.
    let skip = fast.len() - slow.len();
    let macd_line: Vec<Price> = fast[skip..]
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| *f - *s)
        .collect();

    let signal_line = ema(&macd_line, signal_n)?;
    let macd_skip = macd_line.len() - signal_line.len();
    let histogram: Vec<Decimal> = macd_line[macd_skip..]
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m.raw() - s.raw())
        .collect();

    Ok(MacdOutput {
        macd: macd_line[macd_skip..].iter().map(|p| p.raw()).collect(),
        signal: signal_line.iter().map(|p| p.raw()).collect(),
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(vals: &[&str]) -> Vec<Price> {
        vals.iter().map(|v| Price::new(v.parse().unwrap())).collect()
    }

    #[test]
    fn macd_of_flat_series_is_zero() {
        let p = prices(&["10"; 40]);
        let out = macd(&p, 12, 26, 9).unwrap();
        assert!(out.macd.iter().all(|v| *v == dec!(0)));
        assert!(out.histogram.iter().all(|v| *v == dec!(0)));
    }

    #[test]
    fn slow_must_exceed_fast() {
        let p = prices(&["10"; 40]);
        assert!(macd(&p, 26, 12, 9).is_err());
    }

    #[test]
    fn output_vectors_are_same_length() {
        let vals: Vec<String> = (1..=60).map(|i| i.to_string()).collect();
        let p = prices(&vals.iter().map(String::as_str).collect::<Vec<_>>());
        let out = macd(&p, 12, 26, 9).unwrap();
        assert_eq!(out.signal.len(), out.histogram.len());
    }
}
