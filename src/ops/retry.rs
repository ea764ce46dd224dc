//! Bounded backoff for idempotent reads.
//!
//! Writes are never auto-retried here: a failed commit is surfaced because
//! its effect may be unknown. Reads are safe to repeat.

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::core::Timestamp;
use crate::store::{
    Collection, Document, EntityStore, Filter, Record, RecordRef, StoreError, Version, WriteBatch,
};

/// Backoff schedule for retried reads.
///
/// `attempts` counts total tries, so the first failure of a policy with
/// `attempts = 1` surfaces immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 200,
        }
    }
}

/// Run a read, retrying transient failures with jittered backoff.
pub fn read_with_retry<T>(
    policy: &RetryPolicy,
    mut read: impl FnMut() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let mut attempt = 1;
    let mut delay_ms = policy.base_delay_ms;
    loop {
        match read() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.attempts && err.transience().is_retryable() => {
                tracing::debug!(attempt, delay_ms, error = %err, "read failed, backing off");
                thread::sleep(jittered(delay_ms));
                delay_ms = delay_ms.saturating_mul(2).min(policy.max_delay_ms);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn jittered(delay_ms: u64) -> Duration {
    let jitter_ms = delay_ms / 4;
    let jitter = if jitter_ms > 0 {
        rand::rng().random_range(0..=jitter_ms)
    } else {
        0
    };
    Duration::from_millis(delay_ms.saturating_add(jitter))
}

/// Store adapter that retries reads per policy and passes writes through
/// untouched: one submission per commit, failures surfaced.
pub struct RetryReads<'s> {
    store: &'s dyn EntityStore,
    policy: RetryPolicy,
}

impl<'s> RetryReads<'s> {
    pub fn new(store: &'s dyn EntityStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }
}

impl EntityStore for RetryReads<'_> {
    fn get(&self, target: &RecordRef) -> Result<Option<(Document, Version)>, StoreError> {
        read_with_retry(&self.policy, || self.store.get(target))
    }

    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        read_with_retry(&self.policy, || self.store.list(collection, filter))
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.store.commit(batch)
    }

    fn server_timestamp(&self) -> Result<Timestamp, StoreError> {
        read_with_retry(&self.policy, || self.store.server_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let calls = Cell::new(0u32);
        let result = read_with_retry(&fast_policy(3), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StoreError::Unavailable {
                    reason: "flaky".into(),
                })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.expect("third try"), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_failures_surface_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = read_with_retry(&fast_policy(5), || {
            calls.set(calls.get() + 1);
            Err(StoreError::BatchTooLarge {
                max_ops: 500,
                got_ops: 501,
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn budget_exhaustion_surfaces_the_last_error() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = read_with_retry(&fast_policy(3), || {
            calls.set(calls.get() + 1);
            Err(StoreError::Unavailable {
                reason: "down".into(),
            })
        });
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert_eq!(calls.get(), 3);
    }
}
