use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Delimiter used for the causal payload wire format, e.g. `"1.0.2"`.
pub const PAYLOAD_DELIMITER: char = '.';

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("vector clock position {position} out of range for length {len}")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("vector clock length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("malformed causal payload: {0}")]
    Malformed(String),
}

/// Outcome of comparing two vector clocks.
///
/// `a.compare(b) == Dominates` iff `a[i] >= b[i]` for all `i` and
/// `a[j] > b[j]` for some `j`. Equal clocks are `Concurrent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOrder {
    Dominates,
    Dominated,
    Concurrent,
}

/// A per-key vector of per-replica write counters.
///
/// Clocks are immutable: every operation returns a new clock. The length is
/// fixed at the replication factor K for the lifetime of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock(Vec<u64>);

impl VectorClock {
    /// All-zeros clock of length `k`, the causal context of a client write
    /// that supplied no payload.
    pub fn zero(k: usize) -> Self {
        Self(vec![0; k])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[u64] {
        &self.0
    }

    /// Returns a copy of this clock with the counter at `position` bumped by one.
    pub fn increment(&self, position: usize) -> Result<Self, ClockError> {
        if position >= self.0.len() {
            return Err(ClockError::IndexOutOfRange {
                position,
                len: self.0.len(),
            });
        }
        let mut entries = self.0.clone();
        entries[position] += 1;
        Ok(Self(entries))
    }

    /// Pointwise maximum of two equal-length clocks.
    pub fn merge(&self, other: &Self) -> Result<Self, ClockError> {
        if self.0.len() != other.0.len() {
            return Err(ClockError::LengthMismatch {
                left: self.0.len(),
                right: other.0.len(),
            });
        }
        let entries = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (*a).max(*b))
            .collect();
        Ok(Self(entries))
    }

    /// Partial-order comparison. Mismatched lengths have no causal relation
    /// and compare as `Concurrent`.
    pub fn compare(&self, other: &Self) -> ClockOrder {
        if self.0.len() != other.0.len() {
            return ClockOrder::Concurrent;
        }
        let mut ahead = false;
        let mut behind = false;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if a > b {
                ahead = true;
            } else if a < b {
                behind = true;
            }
        }
        match (ahead, behind) {
            (true, false) => ClockOrder::Dominates,
            (false, true) => ClockOrder::Dominated,
            _ => ClockOrder::Concurrent,
        }
    }

    /// Parses a dot-delimited payload, enforcing the expected length K.
    ///
    /// Surrounding whitespace and brackets are tolerated since some clients
    /// echo the payload back in list form (`"[1.0.2]"`).
    pub fn parse(payload: &str, expected_len: usize) -> Result<Self, ClockError> {
        let trimmed = payload.trim().trim_matches(|c| c == '[' || c == ']');
        let entries = trimmed
            .split(PAYLOAD_DELIMITER)
            .map(|token| {
                token
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ClockError::Malformed(format!("non-integer token '{token}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if entries.len() != expected_len {
            return Err(ClockError::LengthMismatch {
                left: entries.len(),
                right: expected_len,
            });
        }
        Ok(Self(entries))
    }

    /// Parses an optional client payload, falling back to the zero clock when
    /// the payload is missing or empty.
    pub fn parse_or_zero(payload: Option<&str>, k: usize) -> Result<Self, ClockError> {
        match payload {
            Some(raw) if !raw.trim().trim_matches(|c| c == '[' || c == ']').is_empty() => {
                Self::parse(raw, k)
            }
            _ => Ok(Self::zero(k)),
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in &self.0 {
            if !first {
                write!(f, "{PAYLOAD_DELIMITER}")?;
            }
            write!(f, "{entry}")?;
            first = false;
        }
        Ok(())
    }
}
