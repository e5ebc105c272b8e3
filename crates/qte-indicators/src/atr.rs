use qte_domain::{DomainError, DomainResult, KLine, Price};
use rust_decimal::Decimal;

/// Average True Range, Wilder smoothed. `TR_t = max(high-low, |high -
/// prevClose|, |low - prevClose|)`; seed = simple mean of the first `n`
/// true ranges, thereafter Wilder smoothing (same recurrence as
/// [`crate::rsi::rsi`]'s averages).
pub fn atr(candles: &[KLine], n: usize) -> DomainResult<Vec<Price>> {
    if n == 0 {
        return Err(DomainError::invalid_argument("ATR period must be > 0"));
    }
    if candles.len() <= n {
        return Err(DomainError::invalid_argument(format!(
            "ATR({n}) needs at least {} candles, got {}",
            n + 1,
            candles.len()
        )));
    }
    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    for w in candles.windows(2) {
        let prev_close = w[0].close;
        let high = w[1].high;
        let low = w[1].low;
        let tr = (high - low)
            .abs()
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        true_ranges.push(tr);
    }

    let n_dec = Decimal::from(n);
    let mut avg = true_ranges[..n].iter().fold(Price::ZERO, |acc, p| acc + *p);
    avg = Price::new(avg.raw() / n_dec);

    let mut out = Vec::with_capacity(true_ranges.len() - n + 1);
    out.push(avg);
    for tr in &true_ranges[n..] {
        avg = Price::new((avg.raw() * (n_dec - Decimal::ONE) + tr.raw()) / n_dec);
        out.push(avg);
    }
    Ok(out)
}
