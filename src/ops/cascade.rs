//! Leaf-first deletion of hierarchy subtrees.
//!
//! Each asset purge is independently atomic (one coordinator batch); the
//! cascade as a whole is not one transaction. A failure stops the walk
//! and reports what was removed, where it stopped, and what was never
//! attempted. Re-invoking the same deletion resumes cleanly: removed
//! children are absent from the next enumeration and record deletes are
//! no-ops on absent targets.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::core::{AssetId, BlockId, RoomId, SectorId};
use crate::error::{Effect, Transience};
use crate::store::{Collection, EntityStore, Filter, RecordRef, WriteBatch};

use super::coordinator::Coordinator;
use super::retry::{RetryPolicy, RetryReads};
use super::OpError;

/// An entity a cascade touches, for progress reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Block(BlockId),
    Sector(SectorId),
    Room(RoomId),
    Asset(AssetId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Block(id) => write!(f, "block {id}"),
            EntityRef::Sector(id) => write!(f, "sector {id}"),
            EntityRef::Room(id) => write!(f, "room {id}"),
            EntityRef::Asset(id) => write!(f, "asset {id}"),
        }
    }
}

/// Cascade failures.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CascadeError {
    /// The walk stopped partway. Everything in `removed` is gone,
    /// `failed` is the entity the walk stopped on, and `pending` was
    /// never attempted, leaf-first.
    #[error("cascade stopped on {failed}: {} removed, {} pending", .removed.len(), .pending.len())]
    Partial {
        removed: Vec<EntityRef>,
        failed: EntityRef,
        #[source]
        source: Box<OpError>,
        pending: Vec<EntityRef>,
    },
}

impl CascadeError {
    /// A resume helps exactly when the underlying failure was transient.
    pub fn transience(&self) -> Transience {
        match self {
            CascadeError::Partial { source, .. } => source.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            CascadeError::Partial { removed, source, .. } => {
                if removed.is_empty() {
                    source.effect()
                } else {
                    Effect::Some
                }
            }
        }
    }
}

struct Stop {
    failed: EntityRef,
    source: OpError,
    pending: Vec<EntityRef>,
}

/// Depth-first, leaf-first deleter for blocks, sectors and rooms.
pub struct CascadeDeleter<'s> {
    store: RetryReads<'s>,
    coordinator: Coordinator<'s>,
}

impl<'s> CascadeDeleter<'s> {
    pub fn new(store: &'s dyn EntityStore) -> Self {
        Self {
            store: RetryReads::new(store, RetryPolicy::default()),
            coordinator: Coordinator::new(store),
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
            coordinator: Coordinator::with_config(store, config),
        }
    }

    pub fn delete_room(&self, id: &RoomId) -> Result<(), CascadeError> {
        self.run(|removed| self.purge_room(id, removed))
    }

    pub fn delete_sector(&self, id: &SectorId) -> Result<(), CascadeError> {
        self.run(|removed| self.purge_sector(id, removed))
    }

    pub fn delete_block(&self, id: &BlockId) -> Result<(), CascadeError> {
        self.run(|removed| self.purge_block(id, removed))
    }

    fn run(
        &self,
        walk: impl FnOnce(&mut Vec<EntityRef>) -> Result<(), Stop>,
    ) -> Result<(), CascadeError> {
        let mut removed = Vec::new();
        match walk(&mut removed) {
            Ok(()) => Ok(()),
            Err(stop) => {
                tracing::warn!(
                    failed = %stop.failed,
                    removed = removed.len(),
                    pending = stop.pending.len(),
                    "cascade stopped partway"
                );
                Err(CascadeError::Partial {
                    removed,
                    failed: stop.failed,
                    source: Box::new(stop.source),
                    pending: stop.pending,
                })
            }
        }
    }

    fn purge_block(&self, id: &BlockId, removed: &mut Vec<EntityRef>) -> Result<(), Stop> {
        let sectors = self
            .children(Collection::Sectors, "block_id", id.as_str(), SectorId::new)
            .map_err(|source| stop_at(EntityRef::Block(id.clone()), source))?;

        let mut queue = sectors.into_iter();
        while let Some(sector_id) = queue.next() {
            if let Err(mut stop) = self.purge_sector(&sector_id, removed) {
                stop.pending.extend(queue.map(EntityRef::Sector));
                stop.pending.push(EntityRef::Block(id.clone()));
                return Err(stop);
            }
        }

        self.delete_record(Collection::Blocks, id.as_str())
            .map_err(|source| stop_at(EntityRef::Block(id.clone()), source))?;
        removed.push(EntityRef::Block(id.clone()));
        Ok(())
    }

    fn purge_sector(&self, id: &SectorId, removed: &mut Vec<EntityRef>) -> Result<(), Stop> {
        let rooms = self
            .children(Collection::Rooms, "sector_id", id.as_str(), RoomId::new)
            .map_err(|source| stop_at(EntityRef::Sector(id.clone()), source))?;

        let mut queue = rooms.into_iter();
        while let Some(room_id) = queue.next() {
            if let Err(mut stop) = self.purge_room(&room_id, removed) {
                stop.pending.extend(queue.map(EntityRef::Room));
                stop.pending.push(EntityRef::Sector(id.clone()));
                return Err(stop);
            }
        }

        // the prefix counter is left alone: the ratchet outlives its sector
        self.delete_record(Collection::Sectors, id.as_str())
            .map_err(|source| stop_at(EntityRef::Sector(id.clone()), source))?;
        removed.push(EntityRef::Sector(id.clone()));
        Ok(())
    }

    fn purge_room(&self, id: &RoomId, removed: &mut Vec<EntityRef>) -> Result<(), Stop> {
        let records = self
            .store
            .list(
                Collection::Assets,
                &Filter::Equals {
                    field: "room_id",
                    value: Value::String(id.as_str().to_string()),
                },
            )
            .map_err(|source| stop_at(EntityRef::Room(id.clone()), source.into()))?;

        // Foreign/legacy records share the collection but were never
        // minted here: no counter claim, no audit history to purge. A
        // raw record delete is enough, and they must not wedge the walk.
        let mut assets = Vec::new();
        for record in records {
            match AssetId::parse(&record.id) {
                Ok(asset_id) => assets.push(asset_id),
                Err(_) => {
                    tracing::debug!(room = %id, record = %record.id, "removing foreign record");
                    self.delete_record(Collection::Assets, &record.id)
                        .map_err(|source| stop_at(EntityRef::Room(id.clone()), source))?;
                }
            }
        }
        tracing::debug!(room = %id, assets = assets.len(), "purging room");

        let mut queue = assets.into_iter();
        while let Some(asset_id) = queue.next() {
            match self.coordinator.delete(&asset_id) {
                Ok(()) => removed.push(EntityRef::Asset(asset_id)),
                // concurrently gone; nothing left to purge
                Err(OpError::NotFound(_)) => {}
                Err(source) => {
                    let mut pending: Vec<EntityRef> = queue.map(EntityRef::Asset).collect();
                    pending.push(EntityRef::Room(id.clone()));
                    return Err(Stop {
                        failed: EntityRef::Asset(asset_id),
                        source,
                        pending,
                    });
                }
            }
        }

        // containers produce no activity entries; only assets feed the log
        self.delete_record(Collection::Rooms, id.as_str())
            .map_err(|source| stop_at(EntityRef::Room(id.clone()), source))?;
        removed.push(EntityRef::Room(id.clone()));
        Ok(())
    }

    fn children<T>(
        &self,
        collection: Collection,
        field: &'static str,
        parent_id: &str,
        parse: impl Fn(String) -> Result<T, crate::core::CoreError>,
    ) -> Result<Vec<T>, OpError> {
        let records = self.store.list(
            collection,
            &Filter::Equals {
                field,
                value: Value::String(parent_id.to_string()),
            },
        )?;
        records
            .into_iter()
            .map(|record| parse(record.id).map_err(OpError::from))
            .collect()
    }

    fn delete_record(&self, collection: Collection, id: &str) -> Result<(), OpError> {
        let mut batch = WriteBatch::new();
        batch.delete(RecordRef::new(collection, id));
        Ok(self.store.commit(batch)?)
    }
}

fn stop_at(failed: EntityRef, source: OpError) -> Stop {
    Stop {
        failed,
        source,
        pending: Vec::new(),
    }
}
