#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod ops;
pub mod store;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::config::Config;
pub use crate::core::{
    ActivityEntry, Asset, AssetDraft, AssetId, AssetStatus, AuditAction, AuditEntry, Block,
    BlockId, CoreError, CounterRecord, EntryId, MutationEvent, MutationPlan, Room, RoomId, Sector,
    SectorId, SectorPrefix, Timestamp,
};
pub use crate::ops::{
    CascadeDeleter, CascadeError, Coordinator, EntityRef, InventoryStats, OpError,
    PrefixAllocator, RelocateReport,
};
pub use crate::store::{
    Collection, EntityStore, Filter, MemoryStore, RecordRef, StoreError, WriteBatch, WriteOp,
};
