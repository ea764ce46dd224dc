//! Layer 5: Mutation planning
//!
//! Pure diff of previous state vs. caller intent. The only read seam is
//! [`RoomNameSource`], so planning unit-tests against a plain map.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::AssetStatus;
use super::entity::{Asset, AssetDraft};
use super::event::{MutationEvent, NOT_APPLICABLE};
use super::identity::RoomId;

/// Resolves room ids to display names for audit readability.
pub trait RoomNameSource {
    fn room_name(&self, id: &RoomId) -> Option<&str>;
}

impl RoomNameSource for BTreeMap<RoomId, String> {
    fn room_name(&self, id: &RoomId) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

/// Field-level patch of an asset record. Unset fields are left untouched
/// by the store's merge write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.room_id.is_none()
    }
}

/// Everything one mutation writes: the record patch plus one event per
/// changed field. Empty plan means the mutation is a no-op and nothing
/// is written at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationPlan {
    pub patch: AssetPatch,
    pub events: Vec<MutationEvent>,
}

impl MutationPlan {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Plan the writes for one asset mutation.
///
/// `previous = None` is a creation: the patch carries every field and the
/// single event is `Created` (`from = "N/A"`, `to = name`). Otherwise one
/// event per changed field; unchanged fields produce nothing.
pub fn diff(previous: Option<&Asset>, next: &AssetDraft, rooms: &dyn RoomNameSource) -> MutationPlan {
    let Some(prev) = previous else {
        return MutationPlan {
            patch: AssetPatch {
                name: Some(next.name.clone()),
                status: Some(next.status),
                room_id: Some(next.room_id.clone()),
            },
            events: vec![MutationEvent::created(&next.name)],
        };
    };

    let mut plan = MutationPlan::default();

    if prev.name != next.name {
        plan.events
            .push(MutationEvent::renamed(&prev.name, &next.name));
        plan.patch.name = Some(next.name.clone());
    }
    if prev.status != next.status {
        plan.events.push(MutationEvent::status_changed(
            prev.status.label(),
            next.status.label(),
            &next.name,
        ));
        plan.patch.status = Some(next.status);
    }
    if prev.room_id != next.room_id {
        plan.events.push(MutationEvent::relocated(
            &room_label(rooms, &prev.room_id),
            &room_label(rooms, &next.room_id),
            &next.name,
        ));
        plan.patch.room_id = Some(next.room_id.clone());
    }

    plan
}

fn room_label(rooms: &dyn RoomNameSource, id: &RoomId) -> String {
    rooms.room_name(id).unwrap_or(NOT_APPLICABLE).to_string()
}
