//! Read views over the audit trail and the hierarchy.
//!
//! Display queries only; nothing here writes. Ordering is by store
//! timestamp descending with an entry-id tiebreak, so entries stamped in
//! the same batch still render in a stable order.

use serde_json::Value;

use crate::config::Config;
use crate::core::{ActivityEntry, Asset, AssetId, AssetStatus, AuditEntry};
use crate::store::{Collection, EntityStore, Filter};

use super::{OpError, decode};

/// Default size of the dashboard activity feed.
pub const DEFAULT_FEED_LIMIT: usize = 10;

/// Headline counts for the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InventoryStats {
    pub blocks: usize,
    pub sectors: usize,
    pub rooms: usize,
    pub assets: usize,
    pub in_use: usize,
    pub lost: usize,
}

/// Per-asset history, most recent first.
pub fn history(store: &dyn EntityStore, asset_id: &AssetId) -> Result<Vec<AuditEntry>, OpError> {
    let records = store.list(
        Collection::Audit,
        &Filter::Equals {
            field: "asset_id",
            value: Value::String(asset_id.as_str().to_string()),
        },
    )?;
    let mut entries: Vec<AuditEntry> = records
        .into_iter()
        .map(|record| decode(Collection::Audit, &record.id, record.data))
        .collect::<Result<_, _>>()?;
    entries.sort_by(|a, b| {
        b.at.cmp(&a.at)
            .then_with(|| b.id.as_str().cmp(a.id.as_str()))
    });
    Ok(entries)
}

/// The newest `limit` entries of the global feed, most recent first.
pub fn recent_activity(
    store: &dyn EntityStore,
    limit: usize,
) -> Result<Vec<ActivityEntry>, OpError> {
    let records = store.list(Collection::Activity, &Filter::All)?;
    let mut entries: Vec<ActivityEntry> = records
        .into_iter()
        .map(|record| decode(Collection::Activity, &record.id, record.data))
        .collect::<Result<_, _>>()?;
    entries.sort_by(|a, b| {
        b.at.cmp(&a.at)
            .then_with(|| b.id.as_str().cmp(a.id.as_str()))
    });
    entries.truncate(limit);
    Ok(entries)
}

/// [`recent_activity`] sized by the configured feed limit.
pub fn recent_activity_with(
    store: &dyn EntityStore,
    config: &Config,
) -> Result<Vec<ActivityEntry>, OpError> {
    recent_activity(store, config.activity.feed_limit)
}

/// Count the hierarchy and tally asset statuses.
pub fn stats(store: &dyn EntityStore) -> Result<InventoryStats, OpError> {
    let mut out = InventoryStats {
        blocks: store.list(Collection::Blocks, &Filter::All)?.len(),
        sectors: store.list(Collection::Sectors, &Filter::All)?.len(),
        rooms: store.list(Collection::Rooms, &Filter::All)?.len(),
        ..InventoryStats::default()
    };
    for record in store.list(Collection::Assets, &Filter::All)? {
        let asset: Asset = decode(Collection::Assets, &record.id, record.data)?;
        out.assets += 1;
        match asset.status {
            AssetStatus::InUse => out.in_use += 1,
            AssetStatus::Lost => out.lost += 1,
            AssetStatus::Stored | AssetStatus::Unknown => {}
        }
    }
    Ok(out)
}
