use qte_domain::{Position, Price, PositionSide};

/// A decision about whether a tracked position's protective stop needs to
/// be re-synced on the exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopSyncDecision {
    /// No change; the exchange-side stop still matches.
    NoChange,
    /// The tracked `stopLoss` moved in the protective direction (up for
    /// LONG, down for SHORT); resync the exchange order to the new price.
    Resync(Price),
    /// The tracked `stopLoss` moved backwards — never propagated; logged
    /// as a no-op rather than silently resyncing to a worse price.
    RejectedRegression,
}

/// Strategy-owned trailing logic mutates a tracked position's `stop_loss`
/// field directly; this evaluates whether that mutation should propagate
/// to the exchange-side protective stop on the next reconciliation pass.
pub fn evaluate_stop_sync(position: &Position, exchange_stop: Option<Price>) -> StopSyncDecision {
    let tracked = position.stop_loss;
    match exchange_stop {
        None => StopSyncDecision::Resync(tracked),
        Some(existing) if existing == tracked => StopSyncDecision::NoChange,
        Some(existing) => {
            let improved = match position.side {
                PositionSide::Long => tracked > existing,
                PositionSide::Short => tracked < existing,
            };
            if improved {
                StopSyncDecision::Resync(tracked)
            } else {
                StopSyncDecision::RejectedRegression
            }
        }
    }
}
