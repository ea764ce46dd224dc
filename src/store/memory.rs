//! In-process document store with full batch/precondition semantics.
//!
//! Backs the test suite and the UI layer's offline/demo mode. Single
//! mutex around the whole state: contention is not a concern at the
//! scale this store is meant for.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use crate::core::{Timestamp, unix_now_ms};

use super::{
    Collection, Document, EntityStore, Filter, MAX_BATCH_OPS, Record, RecordRef, StoreError,
    Version, WriteBatch, WriteOp,
};

type Table = BTreeMap<String, (Document, Version)>;

#[derive(Default)]
struct Inner {
    tables: BTreeMap<Collection, Table>,
    version_counter: u64,
    last_wall: u64,
    last_seq: u32,
}

impl Inner {
    fn contains(&self, target: &RecordRef) -> bool {
        self.tables
            .get(&target.collection)
            .is_some_and(|table| table.contains_key(&target.id))
    }

    fn version_of(&self, target: &RecordRef) -> Option<Version> {
        self.tables
            .get(&target.collection)
            .and_then(|table| table.get(&target.id))
            .map(|(_, version)| *version)
    }

    fn table_mut(&mut self, collection: Collection) -> &mut Table {
        self.tables.entry(collection).or_default()
    }

    // Versions never repeat within a store, so Expect is immune to
    // delete-and-recreate of its target.
    fn bump_version(&mut self) -> Version {
        self.version_counter += 1;
        Version(self.version_counter)
    }
}

/// In-memory [`EntityStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

fn conflict(target: &RecordRef, reason: &'static str) -> StoreError {
    StoreError::Conflict {
        collection: target.collection,
        id: target.id.clone(),
        reason,
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, target: &RecordRef) -> Result<Option<(Document, Version)>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .tables
            .get(&target.collection)
            .and_then(|table| table.get(&target.id))
            .cloned())
    }

    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let inner = self.lock();
        let Some(table) = inner.tables.get(&collection) else {
            return Ok(Vec::new());
        };
        let records = match filter {
            Filter::All => table.iter().map(to_record).collect(),
            Filter::Equals { field, value } => table
                .iter()
                .filter(|(_, (doc, _))| doc.get(*field) == Some(value))
                .map(to_record)
                .collect(),
            Filter::IdRange { start, end } => table
                .range::<str, _>((Bound::Included(start.as_str()), Bound::Excluded(end.as_str())))
                .map(to_record)
                .collect(),
        };
        Ok(records)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let ops = batch.into_ops();
        if ops.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge {
                max_ops: MAX_BATCH_OPS,
                got_ops: ops.len(),
            });
        }

        let mut inner = self.lock();

        // Preconditions are checked against the pre-batch state; nothing
        // is applied unless every one holds.
        for op in &ops {
            match op {
                WriteOp::Create { target, .. } => {
                    if inner.contains(target) {
                        return Err(conflict(target, "already exists"));
                    }
                }
                WriteOp::Update { target, .. } => {
                    if !inner.contains(target) {
                        return Err(conflict(target, "missing"));
                    }
                }
                WriteOp::Expect { target, version } => match inner.version_of(target) {
                    None => return Err(conflict(target, "missing")),
                    Some(stored) if stored != *version => {
                        return Err(conflict(target, "version changed"));
                    }
                    Some(_) => {}
                },
                WriteOp::Set { .. } | WriteOp::Delete { .. } => {}
            }
        }

        for op in ops {
            match op {
                WriteOp::Create { target, data } | WriteOp::Set { target, data } => {
                    let version = inner.bump_version();
                    inner.table_mut(target.collection).insert(target.id, (data, version));
                }
                WriteOp::Update { target, data } => {
                    let version = inner.bump_version();
                    if let Some((existing, stored)) =
                        inner.table_mut(target.collection).get_mut(&target.id)
                    {
                        for (field, value) in data {
                            existing.insert(field, value);
                        }
                        *stored = version;
                    }
                }
                WriteOp::Delete { target } => {
                    inner.table_mut(target.collection).remove(&target.id);
                }
                WriteOp::Expect { .. } => {}
            }
        }

        Ok(())
    }

    fn server_timestamp(&self) -> Result<Timestamp, StoreError> {
        let mut inner = self.lock();
        let now = unix_now_ms();
        if now > inner.last_wall {
            inner.last_wall = now;
            inner.last_seq = 0;
        } else {
            // clock stalled or stepped back: keep the wall, bump the seq
            inner.last_seq += 1;
        }
        Ok(Timestamp::new(inner.last_wall, inner.last_seq))
    }
}

fn to_record((id, (data, _)): (&String, &(Document, Version))) -> Record {
    Record {
        id: id.clone(),
        data: data.clone(),
    }
}
