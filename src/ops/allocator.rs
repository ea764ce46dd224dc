//! Namespace-scoped asset ID allocation.
//!
//! The sequence source of truth is `counters/{prefix}`, a monotonic
//! ratchet claimed under CAS. The claim ops ride in the same atomic batch
//! as the asset create, so a lost race fails the whole batch and nothing
//! is written. A missing counter is seeded from the legacy range scan
//! over existing asset ids.

use crate::core::{AssetId, CounterRecord, Room, RoomId, Sector, SectorId, SectorPrefix};
use crate::store::{Collection, EntityStore, Filter, RecordRef, StoreError, WriteOp};

use super::{OpError, get_typed, to_document};

/// A minted id plus the conditional ops that claim its sequence.
#[derive(Clone, Debug)]
pub struct Allocation {
    pub asset_id: AssetId,
    pub prefix: SectorPrefix,
    /// Staged into the coordinator's batch ahead of the asset create.
    pub claim: Vec<WriteOp>,
}

impl Allocation {
    /// Map a commit failure of a batch carrying this claim.
    ///
    /// Any precondition conflict means the claim (or the asset create
    /// itself) lost a concurrent race; the batch wrote nothing and the
    /// allocation can be re-run.
    pub fn conflict(&self, err: StoreError) -> OpError {
        match err {
            StoreError::Conflict { .. } => OpError::AllocationConflict {
                prefix: self.prefix.clone(),
            },
            other => OpError::Store(other),
        }
    }
}

/// Allocates asset ids under a sector's namespace prefix.
pub struct PrefixAllocator<'s> {
    store: &'s dyn EntityStore,
}

impl<'s> PrefixAllocator<'s> {
    pub fn new(store: &'s dyn EntityStore) -> Self {
        Self { store }
    }

    /// Resolve the destination room to its sector's prefix, then claim
    /// the next sequence.
    pub fn allocate(&self, room_id: &RoomId) -> Result<Allocation, OpError> {
        let room = self.room(room_id)?;
        let sector = self.sector(&room.sector_id)?;
        let prefix = SectorPrefix::parse(&sector.abbreviation).map_err(|source| {
            OpError::InvalidSectorPrefix {
                sector: sector.id.clone(),
                source,
            }
        })?;
        self.claim(prefix)
    }

    /// Claim the next sequence for an already-resolved prefix.
    pub fn claim(&self, prefix: SectorPrefix) -> Result<Allocation, OpError> {
        let counter_ref = RecordRef::new(Collection::Counters, prefix.as_str());
        let (candidate, claim) = match get_typed::<CounterRecord>(self.store, &counter_ref)? {
            Some((counter, version)) => {
                let candidate = counter.last.saturating_add(1);
                let claim = vec![
                    WriteOp::Expect {
                        target: counter_ref.clone(),
                        version,
                    },
                    WriteOp::Set {
                        target: counter_ref,
                        data: to_document(&CounterRecord { last: candidate })?,
                    },
                ];
                (candidate, claim)
            }
            None => {
                let candidate = self.scan_next(&prefix)?;
                let claim = vec![WriteOp::Create {
                    target: counter_ref,
                    data: to_document(&CounterRecord { last: candidate })?,
                }];
                (candidate, claim)
            }
        };

        Ok(Allocation {
            asset_id: AssetId::mint(&prefix, candidate),
            prefix,
            claim,
        })
    }

    /// Legacy seed: one past the highest parseable sequence among existing
    /// ids under the prefix. Foreign ids in the range are skipped.
    fn scan_next(&self, prefix: &SectorPrefix) -> Result<u64, OpError> {
        let records = self.store.list(
            Collection::Assets,
            &Filter::IdRange {
                start: prefix.as_str().to_string(),
                end: format!("{}z", prefix),
            },
        )?;
        let highest = records
            .iter()
            .filter_map(|record| prefix.sequence_of(&record.id))
            .max()
            .unwrap_or(0);
        Ok(highest.saturating_add(1))
    }

    fn room(&self, id: &RoomId) -> Result<Room, OpError> {
        get_typed(self.store, &RecordRef::new(Collection::Rooms, id.as_str()))?
            .map(|(room, _)| room)
            .ok_or_else(|| OpError::InvalidRoom(id.clone()))
    }

    fn sector(&self, id: &SectorId) -> Result<Sector, OpError> {
        get_typed(self.store, &RecordRef::new(Collection::Sectors, id.as_str()))?
            .map(|(sector, _)| sector)
            .ok_or_else(|| OpError::InvalidSector(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Block, BlockId};
    use crate::store::{MemoryStore, WriteBatch};

    struct Tree {
        store: MemoryStore,
        room_id: RoomId,
        sector_id: SectorId,
    }

    fn tree(abbreviation: &str) -> Tree {
        let store = MemoryStore::new();
        let block = Block {
            id: BlockId::generate(),
            name: "Block A".into(),
        };
        let sector = Sector {
            id: SectorId::generate(),
            name: "Technology".into(),
            abbreviation: abbreviation.into(),
            block_id: block.id.clone(),
        };
        let room = Room {
            id: RoomId::generate(),
            name: "Server Room".into(),
            sector_id: sector.id.clone(),
        };

        let mut batch = WriteBatch::new();
        batch.set(
            RecordRef::new(Collection::Blocks, block.id.as_str()),
            to_document(&block).expect("block doc"),
        );
        batch.set(
            RecordRef::new(Collection::Sectors, sector.id.as_str()),
            to_document(&sector).expect("sector doc"),
        );
        batch.set(
            RecordRef::new(Collection::Rooms, room.id.as_str()),
            to_document(&room).expect("room doc"),
        );
        store.commit(batch).expect("seed tree");

        Tree {
            store,
            room_id: room.id,
            sector_id: sector.id,
        }
    }

    fn seed_asset_ids(store: &MemoryStore, ids: &[&str]) {
        let mut batch = WriteBatch::new();
        for id in ids {
            batch.set(
                RecordRef::new(Collection::Assets, *id),
                serde_json::Map::new(),
            );
        }
        store.commit(batch).expect("seed assets");
    }

    #[test]
    fn missing_counter_seeds_from_scan() {
        let t = tree("TIN");
        seed_asset_ids(&t.store, &["TIN001", "TIN004", "TINx9", "TIO001"]);

        let allocation = PrefixAllocator::new(&t.store)
            .allocate(&t.room_id)
            .expect("allocate");
        assert_eq!(allocation.asset_id.as_str(), "TIN005");
        assert!(matches!(allocation.claim.as_slice(), [WriteOp::Create { .. }]));
    }

    #[test]
    fn existing_counter_advances_under_cas() {
        let t = tree("tin"); // lowercase stored abbreviation still parses
        let mut batch = WriteBatch::new();
        batch.set(
            RecordRef::new(Collection::Counters, "TIN"),
            to_document(&CounterRecord { last: 41 }).expect("counter doc"),
        );
        t.store.commit(batch).expect("seed counter");

        let allocation = PrefixAllocator::new(&t.store)
            .allocate(&t.room_id)
            .expect("allocate");
        assert_eq!(allocation.asset_id.as_str(), "TIN042");
        assert!(matches!(
            allocation.claim.as_slice(),
            [WriteOp::Expect { .. }, WriteOp::Set { .. }]
        ));
    }

    #[test]
    fn unknown_room_is_refused() {
        let t = tree("TIN");
        let err = PrefixAllocator::new(&t.store)
            .allocate(&RoomId::generate())
            .expect_err("unknown room");
        assert!(matches!(err, OpError::InvalidRoom(_)));
    }

    #[test]
    fn malformed_abbreviation_refuses_the_mint() {
        let t = tree("TECH1");
        let err = PrefixAllocator::new(&t.store)
            .allocate(&t.room_id)
            .expect_err("bad prefix");
        match err {
            OpError::InvalidSectorPrefix { sector, .. } => assert_eq!(sector, t.sector_id),
            other => panic!("expected InvalidSectorPrefix, got {other:?}"),
        }
    }
}
