//! Trading pair identifier.

use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A base/quote trading pair, e.g. `BTC-USDT`.
///
/// Both legs are stored uppercase. [`Symbol::parse`] accepts the canonical
/// `BASE-QUOTE` form, the `BASE_QUOTE` separator variant, and — for legacy
/// inputs only — the concatenated `BASEUSDT` form when the quote asset is
/// `USDT` (the only quote asset this engine trades; see `maxStopLossPercent`/
/// config discussion in DESIGN.md for why the concatenated form is not
/// generalized to arbitrary quote assets).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    base: String,
    quote: String,
}

const LEGACY_QUOTE: &str = "USDT";

impl Symbol {
    /// Construct directly from already-uppercase base/quote legs.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> DomainResult<Self> {
        let base = base.into();
        let quote = quote.into();
        if base.is_empty() || quote.is_empty() {
            return Err(DomainError::invalid_argument(
                "symbol base and quote must be non-empty",
            ));
        }
        if !base.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            || !quote.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(DomainError::invalid_argument(format!(
                "symbol legs must be uppercase ascii: {base}/{quote}"
            )));
        }
        Ok(Symbol { base, quote })
    }

    /// Parse any of the accepted textual forms.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        if let Some((base, quote)) = upper.split_once('-') {
            return Symbol::new(base, quote);
        }
        if let Some((base, quote)) = upper.split_once('_') {
            return Symbol::new(base, quote);
        }
        if let Some(base) = upper.strip_suffix(LEGACY_QUOTE) {
            if !base.is_empty() {
                return Symbol::new(base, LEGACY_QUOTE);
            }
        }
        Err(DomainError::invalid_argument(format!(
            "unrecognized symbol format: {raw:?}"
        )))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Canonical `BASE-QUOTE` string, used as the tracked-position map key
    /// (`symbol.toPairString()` in the source design).
    pub fn pair_string(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pair_string())
    }
}

impl TryFrom<String> for Symbol {
    type Error = DomainError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.pair_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_hyphen_form() {
        let s = Symbol::parse("BTC-USDT").unwrap();
        assert_eq!(s.base(), "BTC");
        assert_eq!(s.quote(), "USDT");
    }

    #[test]
    fn parses_underscore_form() {
        let s = Symbol::parse("eth_usdt").unwrap();
        assert_eq!(s.base(), "ETH");
        assert_eq!(s.quote(), "USDT");
    }

    #[test]
    fn parses_legacy_concatenated_usdt_form() {
        let s = Symbol::parse("BTCUSDT").unwrap();
        assert_eq!(s.base(), "BTC");
        assert_eq!(s.quote(), "USDT");
    }

    #[test]
    fn rejects_concatenated_form_for_non_usdt_quote() {
        // No separator and no USDT suffix: ambiguous, rejected rather than guessed.
        assert!(Symbol::parse("BTCBUSD").is_err());
    }

    #[test]
    fn rejects_empty_base() {
        assert!(Symbol::parse("USDT").is_err());
    }

    #[test]
    fn pair_string_round_trips_through_parse() {
        let s = Symbol::parse("BTC-USDT").unwrap();
        let round = Symbol::parse(&s.pair_string()).unwrap();
        assert_eq!(s, round);
    }

    #[test]
    fn serde_round_trip() {
        let s = Symbol::parse("BTC-USDT").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"BTC-USDT\"");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
