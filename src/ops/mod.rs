//! Operations over the document store.
//!
//! - `allocator`: namespace-scoped asset ID allocation under a CAS claim
//! - `coordinator`: asset mutations with their audit projections
//! - `cascade`: leaf-first deletion of hierarchy subtrees
//! - `queries`: read views (per-asset history, activity feed, stats)
//! - `retry`: bounded backoff for idempotent reads

pub mod allocator;
pub mod cascade;
pub mod coordinator;
pub mod queries;
pub mod retry;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::{AssetId, CoreError, RoomId, SectorId, SectorPrefix};
use crate::error::{Effect, Transience};
use crate::store::{Collection, Document, EntityStore, RecordRef, StoreError, Version};

pub use allocator::{Allocation, PrefixAllocator};
pub use cascade::{CascadeDeleter, CascadeError, EntityRef};
pub use coordinator::{Coordinator, RelocateReport};
pub use queries::{
    DEFAULT_FEED_LIMIT, InventoryStats, history, recent_activity, recent_activity_with, stats,
};
pub use retry::{RetryPolicy, RetryReads, read_with_retry};

/// Operation errors.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum OpError {
    #[error("room not found: {0}")]
    InvalidRoom(RoomId),

    #[error("sector not found: {0}")]
    InvalidSector(SectorId),

    #[error("sector {sector} has an unusable prefix")]
    InvalidSectorPrefix {
        sector: SectorId,
        #[source]
        source: CoreError,
    },

    #[error("allocation for prefix {prefix} lost a concurrent claim")]
    AllocationConflict { prefix: SectorPrefix },

    #[error("allocation for prefix {prefix} exhausted after {attempts} attempts")]
    AllocationExhausted { prefix: SectorPrefix, attempts: u32 },

    #[error("asset not found: {0}")]
    NotFound(AssetId),

    #[error("malformed record {collection}/{id}: {reason}")]
    Malformed {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

impl OpError {
    /// Whether retrying this operation may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            OpError::AllocationConflict { .. } => Transience::Retryable,
            // contention may subside
            OpError::AllocationExhausted { .. } => Transience::Retryable,
            OpError::Store(e) => e.transience(),
            OpError::Core(e) => e.transience(),
            OpError::InvalidRoom(_)
            | OpError::InvalidSector(_)
            | OpError::InvalidSectorPrefix { .. }
            | OpError::NotFound(_)
            | OpError::Malformed { .. }
            | OpError::Internal(_) => Transience::Permanent,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            OpError::Store(e) => e.effect(),
            OpError::Core(e) => e.effect(),
            // every other refusal happens before or instead of a commit
            _ => Effect::None,
        }
    }
}

// =============================================================================
// Typed record access
// =============================================================================

pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document, OpError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(OpError::Internal("record did not serialize to an object")),
        Err(_) => Err(OpError::Internal("record serialization failed")),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    collection: Collection,
    id: &str,
    data: Document,
) -> Result<T, OpError> {
    serde_json::from_value(serde_json::Value::Object(data)).map_err(|err| OpError::Malformed {
        collection,
        id: id.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) fn get_typed<T: DeserializeOwned>(
    store: &dyn EntityStore,
    target: &RecordRef,
) -> Result<Option<(T, Version)>, OpError> {
    match store.get(target)? {
        Some((data, version)) => {
            let value = decode(target.collection, &target.id, data)?;
            Ok(Some((value, version)))
        }
        None => Ok(None),
    }
}
