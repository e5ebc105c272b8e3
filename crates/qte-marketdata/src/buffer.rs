//! Bounded rolling candle buffer for one (symbol, interval) pair.

use qte_domain::KLine;
use std::collections::VecDeque;

/// Reports a discontinuity between the previously buffered candle and an
/// incoming one: `pushed.open_time != last.close_time`. The manager hands
/// this to the caller (live wiring), which decides whether to trigger a
/// REST backfill; this crate never performs network I/O itself.
#[derive(Clone, Debug, PartialEq)]
pub struct GapReport {
    pub expected_open_time: chrono::DateTime<chrono::Utc>,
    pub actual_open_time: chrono::DateTime<chrono::Utc>,
}

/// A fixed-capacity ring of the most recent `N` closed candles for one
/// (symbol, interval) pair.
#[derive(Debug)]
pub struct CandleBuffer {
    capacity: usize,
    candles: VecDeque<KLine>,
}

impl CandleBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "candle buffer capacity must be > 0");
        CandleBuffer {
            capacity,
            candles: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a closed candle. Returns a [`GapReport`] if it is not
    /// contiguous with the previously buffered candle; the candle is
    /// pushed regardless (the buffer reflects what actually arrived).
    pub fn push(&mut self, candle: KLine) -> Option<GapReport> {
        let gap = self.candles.back().and_then(|last| {
            if candle.open_time != last.close_time {
                Some(GapReport {
                    expected_open_time: last.close_time,
                    actual_open_time: candle.open_time,
                })
            } else {
                None
            }
        });
        if self.candles.len() == self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
        gap
    }

    /// All buffered candles, oldest first — the "rolling window" a
    /// strategy's `analyze` call receives.
    pub fn as_slice_contiguous(&mut self) -> &[KLine] {
        self.candles.make_contiguous()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&KLine> {
        self.candles.back()
    }
}
