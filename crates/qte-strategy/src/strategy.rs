use crate::types::StrategySpec;
use qte_domain::{KLine, Position, Signal};

/// A strategy that reacts to closed candles and to updates on its own open
/// position. Object-safe so the engine can hold
/// `Vec<Box<dyn Strategy>>` — flattening the source's deep `AbstractStrategy`
/// inheritance chain into one capability interface.
pub trait Strategy: Send {
    fn spec(&self) -> &StrategySpec;

    /// Remaining bars of cooldown. The engine skips [`Strategy::analyze`]
    /// while this is greater than zero; it still calls
    /// [`Strategy::on_position_update`] so an open position is never
    /// orphaned during cooldown.
    fn cooldown_remaining(&self) -> u32 {
        0
    }

    /// Called once per closed candle (never on an in-progress candle) with
    /// the full rolling window, oldest first. Returning `Some(signal)`
    /// forwards it to the registered consumer (risk control, live or
    /// backtest).
    fn analyze(&mut self, candles: &[KLine]) -> Option<Signal>;

    /// Called once per closed candle for each open position this strategy
    /// owns — the strategy's chance to emit a discretionary exit. Default
    /// no-op: most strategies rely solely on the risk gate's stop-loss.
    fn on_position_update(&mut self, _position: &Position, _candle: &KLine) -> Option<Signal> {
        None
    }

    /// Called by the engine after a trade is recorded (win or loss),
    /// resetting cooldown bookkeeping. Default no-op.
    fn record_trade(&mut self) {}

    /// Clear any internal state (used by the backtest engine between runs
    /// and by the testkit between scenarios).
    fn reset(&mut self) {}
}
