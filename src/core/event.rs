//! Layer 4: Mutation events and their two read-shapes
//!
//! One canonical [`MutationEvent`] per changed field. The per-asset
//! [`AuditEntry`] and the global [`ActivityEntry`] are projections of that
//! single value, written in the same atomic batch as the field change.

use serde::{Deserialize, Serialize};

use super::domain::AuditAction;
use super::identity::{AssetId, EntryId};
use super::time::Timestamp;

/// Placeholder for a side of a transition that has no value, e.g. the
/// `from` of a creation or the name of a room that no longer exists.
pub const NOT_APPLICABLE: &str = "N/A";

/// Per-asset history record. Owned by its asset and purged with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: EntryId,
    pub asset_id: AssetId,
    pub action: AuditAction,
    pub from: String,
    pub to: String,
    pub asset_name: String,
    pub at: Timestamp,
}

/// Global feed record. Append-only; survives every cascade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: EntryId,
    pub message: String,
    pub at: Timestamp,
}

impl ActivityEntry {
    /// Feed message for an asset deletion.
    ///
    /// Deletion has no audit projection: the asset's history is purged in
    /// the same batch, so only this feed line remains.
    pub fn deletion(asset_id: &AssetId, asset_name: &str, at: Timestamp) -> Self {
        Self {
            id: EntryId::generate(),
            message: format!("Asset \"{}\" ({}) deleted.", asset_name, asset_id),
            at,
        }
    }
}

/// One changed field of one asset.
///
/// `asset_name` is the post-mutation name: the feed always refers to the
/// asset by the name it has after the write lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    pub action: AuditAction,
    pub from: String,
    pub to: String,
    pub asset_name: String,
}

impl MutationEvent {
    pub fn created(name: &str) -> Self {
        Self {
            action: AuditAction::Created,
            from: NOT_APPLICABLE.to_string(),
            to: name.to_string(),
            asset_name: name.to_string(),
        }
    }

    pub fn renamed(from: &str, to: &str) -> Self {
        Self {
            action: AuditAction::Renamed,
            from: from.to_string(),
            to: to.to_string(),
            asset_name: to.to_string(),
        }
    }

    pub fn status_changed(from: &str, to: &str, asset_name: &str) -> Self {
        Self {
            action: AuditAction::StatusChanged,
            from: from.to_string(),
            to: to.to_string(),
            asset_name: asset_name.to_string(),
        }
    }

    pub fn relocated(from: &str, to: &str, asset_name: &str) -> Self {
        Self {
            action: AuditAction::Relocated,
            from: from.to_string(),
            to: to.to_string(),
            asset_name: asset_name.to_string(),
        }
    }

    /// Project the per-asset history record.
    pub fn audit_entry(&self, asset_id: &AssetId, at: Timestamp) -> AuditEntry {
        AuditEntry {
            id: EntryId::generate(),
            asset_id: asset_id.clone(),
            action: self.action,
            from: self.from.clone(),
            to: self.to.clone(),
            asset_name: self.asset_name.clone(),
            at,
        }
    }

    /// Project the global feed record.
    pub fn activity_entry(&self, asset_id: &AssetId, at: Timestamp) -> ActivityEntry {
        ActivityEntry {
            id: EntryId::generate(),
            message: self.message(asset_id),
            at,
        }
    }

    /// Human-readable feed line for this event.
    pub fn message(&self, asset_id: &AssetId) -> String {
        match self.action {
            AuditAction::Created => {
                format!("Asset \"{}\" ({}) created.", self.asset_name, asset_id)
            }
            AuditAction::Renamed => {
                format!(
                    "Asset \"{}\" ({}) renamed to \"{}\".",
                    self.from, asset_id, self.to
                )
            }
            AuditAction::StatusChanged => {
                format!(
                    "Asset \"{}\" ({}) status changed from {} to {}.",
                    self.asset_name, asset_id, self.from, self.to
                )
            }
            AuditAction::Relocated => {
                format!(
                    "Asset \"{}\" ({}) relocated to \"{}\".",
                    self.asset_name, asset_id, self.to
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> AssetId {
        AssetId::parse("TIN005").expect("asset id")
    }

    #[test]
    fn feed_message_shapes() {
        assert_eq!(
            MutationEvent::created("Monitor").message(&id()),
            "Asset \"Monitor\" (TIN005) created."
        );
        assert_eq!(
            MutationEvent::renamed("Monitor", "Monitor 27\"").message(&id()),
            "Asset \"Monitor\" (TIN005) renamed to \"Monitor 27\"\".",
        );
        assert_eq!(
            MutationEvent::status_changed("In Use", "Lost", "Monitor").message(&id()),
            "Asset \"Monitor\" (TIN005) status changed from In Use to Lost."
        );
        assert_eq!(
            MutationEvent::relocated("Server Room", "Lab 2", "Monitor").message(&id()),
            "Asset \"Monitor\" (TIN005) relocated to \"Lab 2\"."
        );
        assert_eq!(
            ActivityEntry::deletion(&id(), "Monitor", Timestamp::new(1, 0)).message,
            "Asset \"Monitor\" (TIN005) deleted."
        );
    }

    #[test]
    fn created_entry_carries_not_applicable_from() {
        let event = MutationEvent::created("Projector");
        let entry = event.audit_entry(&id(), Timestamp::new(7, 0));
        assert_eq!(entry.action, AuditAction::Created);
        assert_eq!(entry.from, NOT_APPLICABLE);
        assert_eq!(entry.to, "Projector");
        assert_eq!(entry.asset_name, "Projector");
        assert_eq!(entry.at, Timestamp::new(7, 0));
    }
}
