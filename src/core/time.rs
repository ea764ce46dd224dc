//! Layer 0: Commit time primitives
//!
//! Timestamps are assigned by the store at commit; entities never stamp
//! themselves. Ordering is (wall_ms, seq) so two commits landing on the
//! same wall millisecond still order deterministically.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Store-assigned commit timestamp.
///
/// Copy is fine here - it's a measurement, not an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub wall_ms: u64,
    pub seq: u32,
}

impl Timestamp {
    pub fn new(wall_ms: u64, seq: u32) -> Self {
        Self { wall_ms, seq }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then_with(|| self.seq.cmp(&other.seq)) // deterministic tiebreak
    }
}

/// Current wall clock in unix milliseconds.
pub fn unix_now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
