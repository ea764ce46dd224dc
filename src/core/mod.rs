//! Core domain types (Layers 0-5)
//!
//! Module hierarchy follows type dependency order:
//! - time: commit timestamps (Layer 0)
//! - identity: SectorPrefix, AssetId, container ids (Layer 1)
//! - domain: AssetStatus, AuditAction (Layer 2)
//! - entity: Block, Sector, Room, Asset, CounterRecord (Layer 3)
//! - event: MutationEvent and its two read-shapes (Layer 4)
//! - diff: mutation planning (Layer 5)

pub mod diff;
pub mod domain;
pub mod entity;
pub mod error;
pub mod event;
pub mod identity;
pub mod time;

pub use diff::{AssetPatch, MutationPlan, RoomNameSource, diff};
pub use domain::{AssetStatus, AuditAction};
pub use entity::{Asset, AssetDraft, Block, CounterRecord, Room, Sector};
pub use error::{CoreError, InvalidField, InvalidId};
pub use event::{ActivityEntry, AuditEntry, MutationEvent, NOT_APPLICABLE};
pub use identity::{AssetId, BlockId, EntryId, RoomId, SectorId, SectorPrefix};
pub use time::{Timestamp, unix_now_ms};
