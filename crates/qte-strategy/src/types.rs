use qte_domain::{Interval, Symbol};

/// Identity of one strategy instance: an id plus the single (symbol,
/// interval) pair it trades. Each strategy instance is scoped to one
/// symbol, so this is not a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySpec {
    pub strategy_id: String,
    pub symbol: Symbol,
    pub interval: Interval,
}

impl StrategySpec {
    pub fn new(strategy_id: impl Into<String>, symbol: Symbol, interval: Interval) -> Self {
        StrategySpec {
            strategy_id: strategy_id.into(),
            symbol,
            interval,
        }
    }
}

/// Errors the [`crate::engine::StrategyEngine`] policy layer can raise —
/// distinct from a `Signal`-producing strategy's own logic errors, which a
/// strategy reports by simply returning `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StrategyEngineError {
    #[error("strategy id {0:?} is already registered")]
    DuplicateStrategyId(String),
}
