//! Seeded campus: two blocks, three sectors, four rooms, and the starter
//! assets TIN001..TIN004 the allocator has to count past.

use tombo::core::{
    Asset, AssetId, AssetStatus, AuditEntry, Block, BlockId, Room, RoomId, Sector, SectorId,
};
use tombo::store::{Collection, Document, EntityStore, Filter, MemoryStore, RecordRef, WriteBatch};

pub struct Campus {
    pub store: MemoryStore,
    pub block_a: BlockId,
    pub block_b: BlockId,
    pub tin: SectorId,
    pub adm: SectorId,
    pub fin: SectorId,
    pub server_room: RoomId,
    pub lab: RoomId,
    pub adm_office: RoomId,
    pub finance_office: RoomId,
}

pub fn doc<T: serde::Serialize>(value: &T) -> Document {
    match serde_json::to_value(value).expect("serialize") {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other:?}"),
    }
}

/// Block A holds sectors TIN (Server Room, Lab 2) and ADM (ADM Office);
/// block B holds FIN (Finance Office). Server Room starts with four
/// assets, TIN001..TIN004.
pub fn campus() -> Campus {
    let store = MemoryStore::new();

    let block_a = Block {
        id: BlockId::generate(),
        name: "Block A".into(),
    };
    let block_b = Block {
        id: BlockId::generate(),
        name: "Block B".into(),
    };
    let tin = Sector {
        id: SectorId::generate(),
        name: "Information Technology".into(),
        abbreviation: "TIN".into(),
        block_id: block_a.id.clone(),
    };
    let adm = Sector {
        id: SectorId::generate(),
        name: "Administration".into(),
        abbreviation: "ADM".into(),
        block_id: block_a.id.clone(),
    };
    let fin = Sector {
        id: SectorId::generate(),
        name: "Finance".into(),
        abbreviation: "FIN".into(),
        block_id: block_b.id.clone(),
    };
    let server_room = Room {
        id: RoomId::generate(),
        name: "Server Room".into(),
        sector_id: tin.id.clone(),
    };
    let lab = Room {
        id: RoomId::generate(),
        name: "Lab 2".into(),
        sector_id: tin.id.clone(),
    };
    let adm_office = Room {
        id: RoomId::generate(),
        name: "ADM Office".into(),
        sector_id: adm.id.clone(),
    };
    let finance_office = Room {
        id: RoomId::generate(),
        name: "Finance Office".into(),
        sector_id: fin.id.clone(),
    };

    let mut batch = WriteBatch::new();
    for block in [&block_a, &block_b] {
        batch.set(
            RecordRef::new(Collection::Blocks, block.id.as_str()),
            doc(block),
        );
    }
    for sector in [&tin, &adm, &fin] {
        batch.set(
            RecordRef::new(Collection::Sectors, sector.id.as_str()),
            doc(sector),
        );
    }
    for room in [&server_room, &lab, &adm_office, &finance_office] {
        batch.set(
            RecordRef::new(Collection::Rooms, room.id.as_str()),
            doc(room),
        );
    }
    for (id, name, status) in [
        ("TIN001", "Router", AssetStatus::InUse),
        ("TIN002", "Switch", AssetStatus::InUse),
        ("TIN003", "Old Printer", AssetStatus::Stored),
        ("TIN004", "Projector", AssetStatus::Unknown),
    ] {
        let asset = Asset {
            id: AssetId::parse(id).expect("seed asset id"),
            name: name.into(),
            room_id: server_room.id.clone(),
            status,
        };
        batch.set(RecordRef::new(Collection::Assets, id), doc(&asset));
    }
    store.commit(batch).expect("seed campus");

    Campus {
        store,
        block_a: block_a.id,
        block_b: block_b.id,
        tin: tin.id,
        adm: adm.id,
        fin: fin.id,
        server_room: server_room.id,
        lab: lab.id,
        adm_office: adm_office.id,
        finance_office: finance_office.id,
    }
}

pub fn asset(store: &dyn EntityStore, id: &AssetId) -> Option<Asset> {
    let (data, _) = store
        .get(&RecordRef::new(Collection::Assets, id.as_str()))
        .expect("get asset")?;
    Some(serde_json::from_value(serde_json::Value::Object(data)).expect("decode asset"))
}

pub fn audit_entries(store: &dyn EntityStore, id: &AssetId) -> Vec<AuditEntry> {
    tombo::ops::history(store, id).expect("history")
}

pub fn activity_messages(store: &dyn EntityStore) -> Vec<String> {
    store
        .list(Collection::Activity, &Filter::All)
        .expect("list activity")
        .into_iter()
        .map(|record| {
            record
                .data
                .get("message")
                .and_then(|v| v.as_str())
                .expect("activity message")
                .to_string()
        })
        .collect()
}

pub fn count(store: &dyn EntityStore, collection: Collection) -> usize {
    store.list(collection, &Filter::All).expect("list").len()
}
