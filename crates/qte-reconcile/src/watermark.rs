//! Snapshot monotonicity watermark.
//!
//! A stale exchange snapshot can mask real position drift by presenting
//! outdated state as current; this tracks the fetch time of the last
//! accepted snapshot and rejects anything older.

use crate::types::ExchangeSnapshot;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotFreshness {
    Fresh,
    Stale { watermark: DateTime<Utc>, got: DateTime<Utc> },
    NoTimestamp,
}

impl SnapshotFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SnapshotFreshness::Fresh)
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_fresh()
    }
}

/// Tracks the last accepted exchange snapshot timestamp to enforce
/// monotonicity. Call [`accept`](Self::accept) on each incoming snapshot;
/// only feed the snapshot to [`crate::reconcile`] if the result is `Fresh`.
#[derive(Clone, Debug)]
pub struct SnapshotWatermark {
    last_accepted: Option<DateTime<Utc>>,
}

impl Default for SnapshotWatermark {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotWatermark {
    pub fn new() -> Self {
        SnapshotWatermark { last_accepted: None }
    }

    pub fn check(&self, snap: &ExchangeSnapshot) -> SnapshotFreshness {
        let Some(got) = snap.fetched_at else {
            return SnapshotFreshness::NoTimestamp;
        };
        if let Some(watermark) = self.last_accepted {
            if got < watermark {
                return SnapshotFreshness::Stale { watermark, got };
            }
        }
        SnapshotFreshness::Fresh
    }

    pub fn accept(&mut self, snap: &ExchangeSnapshot) -> SnapshotFreshness {
        let result = self.check(snap);
        if let SnapshotFreshness::Fresh = result {
            self.last_accepted = snap.fetched_at;
        }
        result
    }

    pub fn last_accepted(&self) -> Option<DateTime<Utc>> {
        self.last_accepted
    }
}
