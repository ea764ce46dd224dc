//! Document store capability.
//!
//! [`EntityStore`] models exactly what the inventory core consumes from its
//! backing document store: point reads, filtered listings, a monotonic
//! server timestamp, and atomic all-or-nothing write batches with
//! preconditions. [`memory::MemoryStore`] is the in-process implementation
//! used by tests and demo mode; it is not part of the core contract.

pub mod memory;

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::Timestamp;
use crate::error::{Effect, Transience};

pub use memory::MemoryStore;

/// Stored document body: a flat JSON object.
pub type Document = Map<String, Value>;

/// Hard cap on ops per batch (the backing store's documented write limit).
///
/// A batch over the cap is refused as [`StoreError::BatchTooLarge`], never
/// silently split: splitting would break the all-or-nothing contract.
pub const MAX_BATCH_OPS: usize = 500;

/// The fixed set of collections the inventory core touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Blocks,
    Sectors,
    Rooms,
    Assets,
    Audit,
    Activity,
    Counters,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Sectors => "sectors",
            Self::Rooms => "rooms",
            Self::Assets => "assets",
            Self::Audit => "audit",
            Self::Activity => "activity",
            Self::Counters => "counters",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRef {
    pub collection: Collection,
    pub id: String,
}

impl RecordRef {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

/// A listed document with its id.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    pub data: Document,
}

/// Per-document write version, asserted by [`WriteOp::Expect`].
///
/// Versions are store-assigned and never repeat within a store, so an
/// Expect cannot be satisfied by a delete-and-recreate of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

/// Listing filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// Documents whose `field` equals `value` (ownership lookups).
    Equals { field: &'static str, value: Value },
    /// Documents whose id falls in the lexicographic range `[start, end)`
    /// (prefix scans).
    IdRange { start: String, end: String },
}

/// One staged write.
#[derive(Clone, Debug)]
pub enum WriteOp {
    /// Insert; the batch fails if the target already exists.
    Create { target: RecordRef, data: Document },
    /// Upsert; replaces the whole document.
    Set { target: RecordRef, data: Document },
    /// Merge fields into an existing document; the batch fails if absent.
    Update { target: RecordRef, data: Document },
    /// Remove; a no-op on an absent target so cascades re-run idempotently.
    Delete { target: RecordRef },
    /// Assert the target exists at exactly this version; writes nothing.
    Expect { target: RecordRef, version: Version },
}

impl WriteOp {
    pub fn target(&self) -> &RecordRef {
        match self {
            WriteOp::Create { target, .. }
            | WriteOp::Set { target, .. }
            | WriteOp::Update { target, .. }
            | WriteOp::Delete { target }
            | WriteOp::Expect { target, .. } => target,
        }
    }
}

/// Atomic all-or-nothing write batch.
///
/// Preconditions (`Create`/`Update`/`Expect`) are evaluated against the
/// pre-batch state; if any fails, nothing in the batch is applied.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, target: RecordRef, data: Document) {
        self.ops.push(WriteOp::Create { target, data });
    }

    pub fn set(&mut self, target: RecordRef, data: Document) {
        self.ops.push(WriteOp::Set { target, data });
    }

    pub fn update(&mut self, target: RecordRef, data: Document) {
        self.ops.push(WriteOp::Update { target, data });
    }

    pub fn delete(&mut self, target: RecordRef) {
        self.ops.push(WriteOp::Delete { target });
    }

    pub fn expect(&mut self, target: RecordRef, version: Version) {
        self.ops.push(WriteOp::Expect { target, version });
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = WriteOp>) {
        self.ops.extend(ops);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Store capability errors.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum StoreError {
    /// A precondition failed: `Create` on an existing target, `Update` on
    /// an absent one, or an `Expect` mismatch. Nothing was written.
    #[error("write conflict on {collection}/{id}: {reason}")]
    Conflict {
        collection: Collection,
        id: String,
        reason: &'static str,
    },

    /// The store could not be reached or timed out.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The batch exceeds [`MAX_BATCH_OPS`].
    #[error("batch exceeds max ops {max_ops} (got {got_ops})")]
    BatchTooLarge { max_ops: usize, got_ops: usize },
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            // the loser of a CAS race can retry with fresh reads
            StoreError::Conflict { .. } => Transience::Retryable,
            StoreError::Unavailable { .. } => Transience::Retryable,
            StoreError::BatchTooLarge { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // batches are all-or-nothing: a refused batch wrote nothing
            StoreError::Conflict { .. } | StoreError::BatchTooLarge { .. } => Effect::None,
            // an outage mid-commit leaves the outcome unknown
            StoreError::Unavailable { .. } => Effect::Unknown,
        }
    }
}

/// The document store as the inventory core consumes it.
///
/// Implementations are shared across request threads; every call is a
/// blocking I/O boundary. `commit` must apply the whole batch or none of
/// it, and must refuse batches over [`MAX_BATCH_OPS`].
pub trait EntityStore: Send + Sync {
    fn get(&self, target: &RecordRef) -> Result<Option<(Document, Version)>, StoreError>;

    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Opaque, monotonic, store-assigned timestamp. One mutation stamps
    /// every record it writes with one value.
    fn server_timestamp(&self) -> Result<Timestamp, StoreError>;
}
