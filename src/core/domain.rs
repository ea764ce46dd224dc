//! Layer 2: Domain enums
//!
//! AssetStatus: in_use, stored, unknown, lost
//! AuditAction: created, renamed, status_changed, relocated

use serde::{Deserialize, Serialize};

/// Asset lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    InUse,
    Stored,
    Unknown,
    Lost,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InUse => "in_use",
            Self::Stored => "stored",
            Self::Unknown => "unknown",
            Self::Lost => "lost",
        }
    }

    /// Display label used in audit fields and feed messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InUse => "In Use",
            Self::Stored => "Stored",
            Self::Unknown => "Unknown",
            Self::Lost => "Lost",
        }
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        Self::Stored
    }
}

/// Audit history action kind.
///
/// Deletion is absent on purpose: audit history dies with its asset, so a
/// deletion leaves only an activity feed message behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Renamed,
    StatusChanged,
    Relocated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Renamed => "renamed",
            Self::StatusChanged => "status_changed",
            Self::Relocated => "relocated",
        }
    }
}
