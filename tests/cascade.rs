//! Hierarchy deletion: leaf-first completeness, partial-failure
//! reporting, and idempotent resumption.

mod fixtures;

use tombo::core::{AssetDraft, AssetStatus};
use tombo::ops::{CascadeDeleter, CascadeError, Coordinator, EntityRef};
use tombo::store::{Collection, EntityStore, Filter, RecordRef, WriteBatch};

use fixtures::{FlakyStore, activity_messages, campus, count, doc};

#[test]
fn deleting_a_block_removes_its_whole_subtree() {
    let campus = campus();
    let coordinator = Coordinator::new(&campus.store);

    // spread some assets with history across block A's rooms
    for room in [&campus.server_room, &campus.lab, &campus.adm_office] {
        let id = coordinator
            .create(&AssetDraft::new("Chair", room.clone(), AssetStatus::InUse))
            .expect("create");
        coordinator
            .change_status(&id, AssetStatus::Stored)
            .expect("status change");
    }
    // block B keeps one asset that must survive
    let survivor = coordinator
        .create(&AssetDraft::new(
            "Safe",
            campus.finance_office.clone(),
            AssetStatus::InUse,
        ))
        .expect("create");
    let feed_before = count(&campus.store, Collection::Activity);

    CascadeDeleter::new(&campus.store)
        .delete_block(&campus.block_a)
        .expect("cascade");

    // block A and everything under it is gone
    assert!(
        campus
            .store
            .get(&RecordRef::new(Collection::Blocks, campus.block_a.as_str()))
            .expect("get")
            .is_none()
    );
    assert_eq!(count(&campus.store, Collection::Sectors), 1);
    assert_eq!(count(&campus.store, Collection::Rooms), 1);
    assert_eq!(count(&campus.store, Collection::Assets), 1);
    assert!(
        fixtures::asset(&campus.store, &survivor).is_some(),
        "block B asset must survive"
    );

    // no orphaned history: the only remaining audit belongs to the survivor
    let orphans = campus
        .store
        .list(Collection::Audit, &Filter::All)
        .expect("list audit")
        .into_iter()
        .filter(|record| {
            record.data.get("asset_id").and_then(|v| v.as_str()) != Some(survivor.as_str())
        })
        .count();
    assert_eq!(orphans, 0);

    // the feed kept everything and gained one deletion line per asset
    // (4 seeded in the server room + 3 created in block A)
    let messages = activity_messages(&campus.store);
    assert_eq!(messages.len(), feed_before + 7);
    assert!(messages.iter().any(|m| m.contains("(TIN001) deleted.")));

    // the prefix ratchet survives the cascade: numbering never restarts
    assert!(
        campus
            .store
            .get(&RecordRef::new(Collection::Counters, "TIN"))
            .expect("get counter")
            .is_some()
    );
}

#[test]
fn interrupted_cascade_reports_progress_and_resumes() {
    let campus = campus();
    let flaky = FlakyStore::new(campus.store);
    let coordinator = Coordinator::new(&flaky);

    // ADM has a single room; fill it with three assets so the walk order
    // is exactly ADM001, ADM002, ADM003
    for n in 1..=3 {
        coordinator
            .create(&AssetDraft::new(
                format!("Chair {n}"),
                campus.adm_office.clone(),
                AssetStatus::InUse,
            ))
            .expect("create");
    }

    let deleter = CascadeDeleter::new(&flaky);
    flaky.fail_commits_after(2);

    let err = deleter
        .delete_sector(&campus.adm)
        .expect_err("injected outage");
    let (removed, failed, pending) = match err {
        CascadeError::Partial {
            removed,
            failed,
            pending,
            ..
        } => (removed, failed, pending),
        other => panic!("expected a partial-cascade report, got {other:?}"),
    };

    assert_eq!(removed.len(), 2);
    assert!(matches!(removed[0], EntityRef::Asset(ref id) if id.as_str() == "ADM001"));
    assert!(matches!(removed[1], EntityRef::Asset(ref id) if id.as_str() == "ADM002"));
    assert!(matches!(failed, EntityRef::Asset(ref id) if id.as_str() == "ADM003"));
    // never attempted, leaf-first: the room, then the sector itself
    assert_eq!(
        pending,
        vec![
            EntityRef::Room(campus.adm_office.clone()),
            EntityRef::Sector(campus.adm.clone()),
        ]
    );

    // what the report says is removed really is, and only that
    assert!(fixtures::asset(&flaky, &tombo::core::AssetId::parse("ADM001").unwrap()).is_none());
    assert!(fixtures::asset(&flaky, &tombo::core::AssetId::parse("ADM003").unwrap()).is_some());

    // resume after the outage: the survivors are re-enumerated and the
    // walk completes
    flaky.heal();
    deleter.delete_sector(&campus.adm).expect("resumed cascade");
    assert_eq!(count(&flaky, Collection::Assets), 4); // seeded TIN001..TIN004
    assert_eq!(count(&flaky, Collection::Rooms), 3);
    assert_eq!(count(&flaky, Collection::Audit), 0);
    assert_eq!(
        activity_messages(&flaky)
            .iter()
            .filter(|m| m.ends_with("deleted."))
            .count(),
        3
    );
}

#[test]
fn foreign_records_do_not_block_room_deletion() {
    let campus = campus();

    // shares the assets collection and the room, but was never minted
    // here: no parseable sequence, no counter claim, no audit history
    let mut batch = WriteBatch::new();
    batch.set(
        RecordRef::new(Collection::Assets, "TINventory-legacy"),
        doc(&serde_json::json!({ "room_id": campus.server_room.as_str() })),
    );
    campus.store.commit(batch).expect("seed foreign record");

    CascadeDeleter::new(&campus.store)
        .delete_room(&campus.server_room)
        .expect("cascade past the foreign record");

    assert_eq!(count(&campus.store, Collection::Assets), 0);
    assert!(
        campus
            .store
            .get(&RecordRef::new(Collection::Rooms, campus.server_room.as_str()))
            .expect("get")
            .is_none()
    );
    // only minted assets feed the activity log: 4 deletion lines, none
    // for the foreign record
    assert_eq!(count(&campus.store, Collection::Activity), 4);
}

#[test]
fn re_deleting_an_already_deleted_room_is_a_noop() {
    let campus = campus();
    let deleter = CascadeDeleter::new(&campus.store);

    deleter.delete_room(&campus.server_room).expect("first run");
    assert_eq!(count(&campus.store, Collection::Assets), 0);

    // second run enumerates nothing and succeeds
    deleter.delete_room(&campus.server_room).expect("re-run");

    // so does deleting a room that never existed
    deleter
        .delete_room(&tombo::core::RoomId::generate())
        .expect("absent room");
}

#[test]
fn deleting_a_room_purges_each_asset_atomically() {
    let campus = campus();
    let coordinator = Coordinator::new(&campus.store);

    // give a seeded asset some history first
    let id = tombo::core::AssetId::parse("TIN002").expect("id");
    coordinator
        .change_status(&id, AssetStatus::Lost)
        .expect("status change");
    assert_eq!(fixtures::audit_entries(&campus.store, &id).len(), 1);

    CascadeDeleter::new(&campus.store)
        .delete_room(&campus.server_room)
        .expect("cascade");

    assert_eq!(count(&campus.store, Collection::Assets), 0);
    assert_eq!(count(&campus.store, Collection::Audit), 0);
    // 1 status line + 4 deletion lines
    assert_eq!(count(&campus.store, Collection::Activity), 5);
    // the room's sector is untouched by a room-level delete
    assert!(
        campus
            .store
            .get(&RecordRef::new(Collection::Sectors, campus.tin.as_str()))
            .expect("get")
            .is_some()
    );
}
