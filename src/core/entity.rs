//! Layer 3: Stored entities
//!
//! Block > Sector > Room > Asset hierarchy, plus the per-prefix counter
//! record backing ID allocation. Shapes mirror the stored documents 1:1.

use serde::{Deserialize, Serialize};

use super::domain::AssetStatus;
use super::error::{CoreError, InvalidField};
use super::identity::{AssetId, BlockId, RoomId, SectorId};

/// Root of the location hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
}

/// Sector within a block. `abbreviation` is the raw stored string; it is
/// parsed into a [`SectorPrefix`](super::identity::SectorPrefix) at
/// allocation time so malformed legacy values fail the mint, not the read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub abbreviation: String,
    pub block_id: BlockId,
}

/// Room within a sector. Assets live in rooms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub sector_id: SectorId,
}

/// Tracked asset. `id` is minted at creation and never changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub room_id: RoomId,
    pub status: AssetStatus,
}

/// Caller intent for creating or mutating an asset.
///
/// Carries everything but the id: creation mints one, mutation keeps it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDraft {
    pub name: String,
    pub room_id: RoomId,
    pub status: AssetStatus,
}

impl AssetDraft {
    pub fn new(name: impl Into<String>, room_id: RoomId, status: AssetStatus) -> Self {
        Self {
            name: name.into(),
            room_id,
            status,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(InvalidField {
                field: "name",
                reason: "empty".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// Per-prefix allocation ratchet: highest sequence ever claimed.
///
/// Monotonic. Never decremented, never deleted by cascades - a minted id
/// must not come back after its asset is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub last: u64,
}
