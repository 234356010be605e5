use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::clock::vector::{ClockOrder, VectorClock};

/// A stored value together with its causal context.
///
/// Records are replaced wholesale on every write or merge, never mutated in
/// place. The timestamp is the wall clock of the node that produced the
/// record, used only as the last-writer-wins tiebreak between causally
/// concurrent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub value: String,
    pub clock: VectorClock,
    pub timestamp: u64,
}

impl Record {
    pub fn new(value: String, clock: VectorClock) -> Self {
        Self {
            value,
            clock,
            timestamp: now_ms(),
        }
    }

    /// Reconciliation rule for the anti-entropy merge path.
    ///
    /// Returns `true` when `incoming` should replace this record: its clock
    /// dominates, or the clocks are concurrent and `incoming` carries an
    /// equal-or-larger timestamp (ties adopt the incoming record).
    pub fn superseded_by(&self, incoming: &Record) -> bool {
        match self.clock.compare(&incoming.clock) {
            ClockOrder::Dominates => false,
            ClockOrder::Dominated => true,
            ClockOrder::Concurrent => incoming.timestamp >= self.timestamp,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
