//! Asset mutation coordination.
//!
//! Every mutation stages its record write and both audit projections into
//! one atomic batch stamped with one server timestamp. Only the
//! allocation claim and the delete guard are retried (bounded); every
//! other failure surfaces typed, with nothing written.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::core::{
    ActivityEntry, Asset, AssetDraft, AssetId, AssetStatus, MutationEvent, MutationPlan, Room,
    RoomId, Timestamp, diff,
};
use crate::store::{Collection, EntityStore, Filter, RecordRef, StoreError, Version, WriteBatch};

use super::allocator::PrefixAllocator;
use super::retry::{RetryPolicy, RetryReads};
use super::{OpError, get_typed, to_document};

/// Default budget for re-running a lost allocation claim (and for the
/// delete guard, which shares it).
pub(crate) const DEFAULT_MUTATION_ATTEMPTS: u32 = 5;

/// Outcome of a bulk relocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelocateReport {
    pub moved: Vec<AssetId>,
    /// Selected assets that vanished before the write.
    pub missing: Vec<AssetId>,
    /// Selected assets already in the destination room.
    pub already_there: Vec<AssetId>,
}

/// Orchestrates asset mutations against the document store.
pub struct Coordinator<'s> {
    store: RetryReads<'s>,
    attempts: u32,
}

impl<'s> Coordinator<'s> {
    pub fn new(store: &'s dyn EntityStore) -> Self {
        Self {
            store: RetryReads::new(store, RetryPolicy::default()),
            attempts: DEFAULT_MUTATION_ATTEMPTS,
        }
    }

    pub fn with_config(store: &'s dyn EntityStore, config: &Config) -> Self {
        Self {
            store: RetryReads::new(
                store,
                RetryPolicy {
                    attempts: config.reads.attempts,
                    base_delay_ms: config.reads.base_delay_ms,
                    max_delay_ms: config.reads.max_delay_ms,
                },
            ),
            attempts: config.allocation.attempts,
        }
    }

    /// Create an asset: allocation claim + full record + `Created`
    /// projections, one batch. A lost claim re-runs the allocation; any
    /// other failure surfaces with nothing written.
    pub fn create(&self, draft: &AssetDraft) -> Result<AssetId, OpError> {
        draft.validate()?;
        let allocator = PrefixAllocator::new(&self.store);

        let mut attempt = 1;
        loop {
            let allocation = allocator.allocate(&draft.room_id)?;
            let asset = Asset {
                id: allocation.asset_id.clone(),
                name: draft.name.clone(),
                room_id: draft.room_id.clone(),
                status: draft.status,
            };
            let plan = diff(None, draft, &BTreeMap::<RoomId, String>::new());
            let at = self.store.server_timestamp()?;

            let mut batch = WriteBatch::new();
            batch.extend(allocation.claim.iter().cloned());
            batch.create(
                RecordRef::new(Collection::Assets, asset.id.as_str()),
                to_document(&asset)?,
            );
            self.stage_events(&mut batch, &plan.events, &asset.id, at)?;

            match self.store.commit(batch) {
                Ok(()) => return Ok(asset.id),
                Err(err) => match allocation.conflict(err) {
                    OpError::AllocationConflict { prefix } if attempt < self.attempts => {
                        tracing::debug!(%prefix, attempt, "allocation claim lost, re-running");
                        attempt += 1;
                    }
                    OpError::AllocationConflict { prefix } => {
                        return Err(OpError::AllocationExhausted {
                            prefix,
                            attempts: attempt,
                        });
                    }
                    other => return Err(other),
                },
            }
        }
    }

    /// Apply a caller intent to an existing asset. An unchanged draft
    /// writes nothing at all.
    pub fn update(&self, asset_id: &AssetId, draft: &AssetDraft) -> Result<(), OpError> {
        draft.validate()?;
        let (current, _) = self.load(asset_id)?;
        self.apply(&current, draft)
    }

    /// Status-only mutation; the other fields carry over unchanged.
    pub fn change_status(&self, asset_id: &AssetId, status: AssetStatus) -> Result<(), OpError> {
        let (current, _) = self.load(asset_id)?;
        let draft = AssetDraft::new(current.name.clone(), current.room_id.clone(), status);
        self.apply(&current, &draft)
    }

    /// Delete an asset with its entire audit history and append one feed
    /// entry, all in one batch. The version guard re-runs the purge when
    /// a concurrent mutation appended history between the enumeration
    /// and the commit.
    pub fn delete(&self, asset_id: &AssetId) -> Result<(), OpError> {
        let mut attempt = 1;
        loop {
            let (asset, version) = self.load(asset_id)?;
            let entries = self.audit_refs(asset_id)?;
            let at = self.store.server_timestamp()?;

            let asset_ref = RecordRef::new(Collection::Assets, asset_id.as_str());
            let mut batch = WriteBatch::new();
            batch.expect(asset_ref.clone(), version);
            batch.delete(asset_ref);
            for entry in entries {
                batch.delete(entry);
            }
            let activity = ActivityEntry::deletion(asset_id, &asset.name, at);
            batch.set(
                RecordRef::new(Collection::Activity, activity.id.as_str()),
                to_document(&activity)?,
            );

            match self.store.commit(batch) {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict { .. }) if attempt < self.attempts => {
                    tracing::debug!(asset = %asset_id, attempt, "asset changed mid-purge, re-enumerating");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Move many assets into one destination room as one atomic write.
    ///
    /// Assets already in the destination and assets that vanished since
    /// selection are skipped and reported, not failed.
    pub fn relocate(
        &self,
        asset_ids: &[AssetId],
        dest_room_id: &RoomId,
    ) -> Result<RelocateReport, OpError> {
        let mut attempt = 1;
        loop {
            match self.try_relocate(asset_ids, dest_room_id) {
                Err(OpError::Store(StoreError::Conflict { .. })) if attempt < self.attempts => {
                    // an asset vanished between load and commit; re-read
                    // so it lands in the missing list instead
                    tracing::debug!(attempt, "relocation set changed mid-write, re-reading");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn try_relocate(
        &self,
        asset_ids: &[AssetId],
        dest_room_id: &RoomId,
    ) -> Result<RelocateReport, OpError> {
        let dest = self
            .room(dest_room_id)?
            .ok_or_else(|| OpError::InvalidRoom(dest_room_id.clone()))?;

        let mut rooms = BTreeMap::new();
        rooms.insert(dest.id.clone(), dest.name.clone());

        let mut report = RelocateReport::default();
        let mut staged: Vec<(Asset, MutationPlan)> = Vec::new();
        let mut seen = BTreeSet::new();

        for asset_id in asset_ids {
            if !seen.insert(asset_id.clone()) {
                continue;
            }
            let target = RecordRef::new(Collection::Assets, asset_id.as_str());
            let Some((asset, _)) = get_typed::<Asset>(&self.store, &target)? else {
                report.missing.push(asset_id.clone());
                continue;
            };
            if asset.room_id == *dest_room_id {
                report.already_there.push(asset_id.clone());
                continue;
            }
            if !rooms.contains_key(&asset.room_id) {
                if let Some(origin) = self.room(&asset.room_id)? {
                    rooms.insert(asset.room_id.clone(), origin.name);
                }
            }
            let draft = AssetDraft::new(asset.name.clone(), dest_room_id.clone(), asset.status);
            let plan = diff(Some(&asset), &draft, &rooms);
            staged.push((asset, plan));
        }

        if staged.is_empty() {
            return Ok(report);
        }

        let at = self.store.server_timestamp()?;
        let mut batch = WriteBatch::new();
        for (asset, plan) in &staged {
            batch.update(
                RecordRef::new(Collection::Assets, asset.id.as_str()),
                to_document(&plan.patch)?,
            );
            self.stage_events(&mut batch, &plan.events, &asset.id, at)?;
        }
        self.store.commit(batch)?;

        report.moved = staged.into_iter().map(|(asset, _)| asset.id).collect();
        Ok(report)
    }

    fn apply(&self, current: &Asset, draft: &AssetDraft) -> Result<(), OpError> {
        let rooms = self.room_names(&[&current.room_id, &draft.room_id])?;
        let plan = diff(Some(current), draft, &rooms);
        if plan.is_empty() {
            return Ok(());
        }
        // A move must land in a room that exists; renames and status
        // changes tolerate an already-deleted origin.
        if plan.patch.room_id.is_some() && !rooms.contains_key(&draft.room_id) {
            return Err(OpError::InvalidRoom(draft.room_id.clone()));
        }

        let at = self.store.server_timestamp()?;
        let mut batch = WriteBatch::new();
        batch.update(
            RecordRef::new(Collection::Assets, current.id.as_str()),
            to_document(&plan.patch)?,
        );
        self.stage_events(&mut batch, &plan.events, &current.id, at)?;

        match self.store.commit(batch) {
            Ok(()) => Ok(()),
            // the only staged precondition is the record update itself
            Err(StoreError::Conflict { .. }) => Err(OpError::NotFound(current.id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    fn stage_events(
        &self,
        batch: &mut WriteBatch,
        events: &[MutationEvent],
        asset_id: &AssetId,
        at: Timestamp,
    ) -> Result<(), OpError> {
        for event in events {
            let audit = event.audit_entry(asset_id, at);
            batch.set(
                RecordRef::new(Collection::Audit, audit.id.as_str()),
                to_document(&audit)?,
            );
            let activity = event.activity_entry(asset_id, at);
            batch.set(
                RecordRef::new(Collection::Activity, activity.id.as_str()),
                to_document(&activity)?,
            );
        }
        Ok(())
    }

    fn load(&self, asset_id: &AssetId) -> Result<(Asset, Version), OpError> {
        get_typed(
            &self.store,
            &RecordRef::new(Collection::Assets, asset_id.as_str()),
        )?
        .ok_or_else(|| OpError::NotFound(asset_id.clone()))
    }

    fn room(&self, id: &RoomId) -> Result<Option<Room>, OpError> {
        Ok(
            get_typed(&self.store, &RecordRef::new(Collection::Rooms, id.as_str()))?
                .map(|(room, _)| room),
        )
    }

    fn room_names(&self, ids: &[&RoomId]) -> Result<BTreeMap<RoomId, String>, OpError> {
        let mut names = BTreeMap::new();
        for id in ids {
            if names.contains_key(*id) {
                continue;
            }
            if let Some(room) = self.room(id)? {
                names.insert((*id).clone(), room.name);
            }
        }
        Ok(names)
    }

    fn audit_refs(&self, asset_id: &AssetId) -> Result<Vec<RecordRef>, OpError> {
        let records = self.store.list(
            Collection::Audit,
            &Filter::Equals {
                field: "asset_id",
                value: serde_json::Value::String(asset_id.as_str().to_string()),
            },
        )?;
        Ok(records
            .into_iter()
            .map(|record| RecordRef::new(Collection::Audit, record.id))
            .collect())
    }
}
