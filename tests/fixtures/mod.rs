#![allow(dead_code)]

mod inventory;

pub use inventory::*;

use std::sync::Mutex;

use tombo::core::Timestamp;
use tombo::store::{
    Collection, Document, EntityStore, Filter, MemoryStore, Record, RecordRef, StoreError,
    Version, WriteBatch,
};

/// Store decorator whose commits start failing on cue.
///
/// Reads always pass through; only `commit` consumes the budget. Used to
/// prove batches are all-or-nothing and cascades stop with a usable
/// progress report.
pub struct FlakyStore {
    inner: MemoryStore,
    commit_budget: Mutex<Option<u32>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            commit_budget: Mutex::new(None),
        }
    }

    /// Let `allowed` more commits through, then fail every one.
    pub fn fail_commits_after(&self, allowed: u32) {
        *self.commit_budget.lock().expect("budget lock") = Some(allowed);
    }

    /// Back to normal: commits pass through again.
    pub fn heal(&self) {
        *self.commit_budget.lock().expect("budget lock") = None;
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl EntityStore for FlakyStore {
    fn get(&self, target: &RecordRef) -> Result<Option<(Document, Version)>, StoreError> {
        self.inner.get(target)
    }

    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.inner.list(collection, filter)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut budget = self.commit_budget.lock().expect("budget lock");
        match budget.as_mut() {
            None => self.inner.commit(batch),
            Some(0) => Err(StoreError::Unavailable {
                reason: "injected outage".into(),
            }),
            Some(remaining) => {
                *remaining -= 1;
                self.inner.commit(batch)
            }
        }
    }

    fn server_timestamp(&self) -> Result<Timestamp, StoreError> {
        self.inner.server_timestamp()
    }
}
