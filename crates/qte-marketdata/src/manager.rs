//! `MarketDataManager`: one candle buffer per (symbol, interval), fanning
//! out closed candles to registered listeners.

use crate::buffer::{CandleBuffer, GapReport};
use qte_domain::{Interval, KLine, Symbol};
use std::collections::HashMap;
use tracing::warn;

/// Registration key for a candle-buffer/listener pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription {
    pub symbol: Symbol,
    pub interval: Interval,
}

/// Owns the rolling buffers and dispatches candle-close events.
///
/// Intermediate (still-forming) candle updates never reach listeners —
/// only a push where `candle.is_complete` is true triggers fan-out (spec
/// §4.2). This type does no I/O; the live wiring feeds it pushes from a
/// WebSocket parser task and reads `GapReport`s to decide on REST backfill.
pub struct MarketDataManager {
    capacity: usize,
    buffers: HashMap<Subscription, CandleBuffer>,
}

impl MarketDataManager {
    pub fn new(capacity: usize) -> Self {
        MarketDataManager {
            capacity,
            buffers: HashMap::new(),
        }
    }

    fn buffer_mut(&mut self, sub: &Subscription) -> &mut CandleBuffer {
        self.buffers
            .entry(sub.clone())
            .or_insert_with(|| CandleBuffer::new(self.capacity))
    }

    /// Accept a pushed candle. Returns `Some(window)` with the up-to-date
    /// rolling window (oldest first) only when `candle.is_complete` is
    /// true — the dispatch signal the strategy engine acts on. A gap, if
    /// any, is logged and also returned so the caller can decide on a
    /// backfill.
    pub fn push(&mut self, candle: KLine) -> PushOutcome<'_> {
        let sub = Subscription {
            symbol: candle.symbol.clone(),
            interval: candle.interval,
        };
        let is_complete = candle.is_complete;
        let buf = self.buffer_mut(&sub);
        let gap = buf.push(candle);
        if let Some(g) = &gap {
            warn!(
                symbol = %sub.symbol,
                interval = %sub.interval,
                expected = %g.expected_open_time,
                actual = %g.actual_open_time,
                "candle gap detected"
            );
        }
        if is_complete {
            PushOutcome {
                gap,
                window: Some(self.buffers.get_mut(&sub).unwrap().as_slice_contiguous()),
            }
        } else {
            PushOutcome { gap, window: None }
        }
    }

    pub fn window(&mut self, sub: &Subscription) -> Option<&[KLine]> {
        self.buffers.get_mut(sub).map(|b| b.as_slice_contiguous())
    }
}

pub struct PushOutcome<'a> {
    pub gap: Option<GapReport>,
    /// `Some` only on a candle-close push; this is the event that should
    /// fan out to strategies subscribed to `sub`.
    pub window: Option<&'a [KLine]>,
}
