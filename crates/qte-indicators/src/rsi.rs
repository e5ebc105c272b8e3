use qte_domain::{DomainError, DomainResult, Price};
use rust_decimal::Decimal;

/// Relative Strength Index with Wilder smoothing. Returns length `L - n`
/// for `L` input prices. `rsi = 100 - 100/(1+rs)`, `rs = avgGain/avgLoss`.
pub fn rsi(prices: &[Price], n: usize) -> DomainResult<Vec<Decimal>> {
    if n == 0 {
        return Err(DomainError::invalid_argument("RSI period must be > 0"));
    }
    if prices.len() <= n {
        return Err(DomainError::invalid_argument(format!(
            "RSI({n}) needs at least {} prices, got {}",
            n + 1,
            prices.len()
        )));
    }
    let deltas: Vec<Decimal> = prices.windows(2).map(|w| (w[1] - w[0]).raw()).collect();
    let gain = |d: Decimal| if d > Decimal::ZERO { d } else { Decimal::ZERO };
    let loss = |d: Decimal| if d < Decimal::ZERO { -d } else { Decimal::ZERO };

    let n_dec = Decimal::from(n);
    let mut avg_gain: Decimal = deltas[..n].iter().copied().map(gain).sum::<Decimal>() / n_dec;
    let mut avg_loss: Decimal = deltas[..n].iter().copied().map(loss).sum::<Decimal>() / n_dec;

    let mut out = Vec::with_capacity(deltas.len() - n + 1);
    out.push(rsi_value(avg_gain, avg_loss));

    for d in &deltas[n..] {
        avg_gain = (avg_gain * (n_dec - Decimal::ONE) + gain(*d)) / n_dec;
        avg_loss = (avg_loss * (n_dec - Decimal::ONE) + loss(*d)) / n_dec;
        out.push(rsi_value(avg_gain, avg_loss));
    }
    Ok(out)
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::from(100);
    }
    let rs = avg_gain / avg_loss;
    Decimal::from(100) - Decimal::from(100) / (Decimal::ONE + rs)
}

/// `true` if the latest RSI reading is at or above `threshold`.
pub fn is_overbought(values: &[Decimal], threshold: Decimal) -> bool {
    values.last().is_some_and(|v| *v >= threshold)
}

/// `true` if the latest RSI reading is at or below `threshold`.
pub fn is_oversold(values: &[Decimal], threshold: Decimal) -> bool {
    values.last().is_some_and(|v| *v <= threshold)
}
