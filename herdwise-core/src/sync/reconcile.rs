//! Identity-preserving reconciliation of dependent rows.
//!
//! Nutrition entries and waste groups hang off category rows. When the
//! category list changes shape, entries follow their category type, not
//! their list position: a row that moved from index 0 to index 2 keeps its
//! feed data, and a new type starts from defaults.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::models::{CategoryRow, NutritionRecord, WasteGroup, WasteRecord};
use crate::store::RowSet;

/// Index of the first row carrying each category identity.
fn first_index_by_identity(rows: &[CategoryRow]) -> HashMap<&str, usize> {
    let mut map = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        if let Some(identity) = row.identity() {
            map.entry(identity).or_insert(i);
        }
    }
    map
}

/// Rebuilds the four nutrition lists for `next` rows.
pub fn reconcile_nutrition(
    previous_rows: &[CategoryRow],
    previous: &NutritionRecord,
    next_rows: &[CategoryRow],
) -> NutritionRecord {
    let by_identity = first_index_by_identity(previous_rows);
    let mut record = NutritionRecord {
        grazing: Vec::with_capacity(next_rows.len()),
        ingredients: Vec::with_capacity(next_rows.len()),
        concentrates: Vec::with_capacity(next_rows.len()),
        additives: Vec::with_capacity(next_rows.len()),
        ..previous.clone()
    };

    for row in next_rows {
        let prior = row.identity().and_then(|id| by_identity.get(id)).copied();
        record.grazing.push(
            prior
                .and_then(|i| previous.grazing.get(i).cloned())
                .unwrap_or_default(),
        );
        record.ingredients.push(
            prior
                .and_then(|i| previous.ingredients.get(i).cloned())
                .unwrap_or_default(),
        );
        record.concentrates.push(
            prior
                .and_then(|i| previous.concentrates.get(i).cloned())
                .unwrap_or_default(),
        );
        record.additives.push(
            prior
                .and_then(|i| previous.additives.get(i).cloned())
                .unwrap_or_default(),
        );
    }

    record
}

/// One waste group per distinct category type, in row order.
pub fn reconcile_waste(
    batch_id: Uuid,
    previous: &[WasteGroup],
    next_rows: &[CategoryRow],
) -> Vec<WasteGroup> {
    let mut seen = HashSet::new();
    let mut groups = Vec::new();
    for row in next_rows {
        let Some(identity) = row.identity() else {
            continue;
        };
        if !seen.insert(identity) {
            continue;
        }
        let group = match previous.iter().find(|g| g.category == identity) {
            Some(prior) => WasteGroup {
                label: row.label(),
                ..prior.clone()
            },
            None => WasteGroup::new(batch_id, identity, row.label()),
        };
        groups.push(group);
    }
    groups
}

/// Rebuilds a row set around a new category list.
pub fn reconcile(previous: &RowSet, next_rows: Vec<CategoryRow>) -> RowSet {
    let batch_id = previous.nutrition.batch_id;
    let nutrition = reconcile_nutrition(&previous.categories, &previous.nutrition, &next_rows);
    let waste = reconcile_waste(batch_id, &previous.waste, &next_rows);
    debug!(
        previous = previous.categories.len(),
        next = next_rows.len(),
        waste_groups = waste.len(),
        "reconciled row set"
    );
    let mut set = RowSet {
        categories: next_rows,
        nutrition,
        waste,
    };
    for (i, row) in set.categories.iter_mut().enumerate() {
        row.position = i as u32;
    }
    set
}

/// Merges a fresh read of stored rows with the local list.
///
/// Stored rows replace their local copies (matched by id or row key).
/// Local rows that were never saved are kept in place; local rows that were
/// saved but are gone from storage are dropped. Stored rows unknown locally
/// are appended.
pub fn merge_fresh(local: &[CategoryRow], fresh: Vec<CategoryRow>) -> Vec<CategoryRow> {
    let mut remaining: Vec<Option<CategoryRow>> = fresh.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(local.len().max(remaining.len()));

    for row in local {
        let matched = remaining.iter_mut().find(|slot| match slot {
            Some(stored) => {
                stored.row_key == row.row_key || (row.id.is_some() && stored.id == row.id)
            }
            None => false,
        });
        match matched.and_then(Option::take) {
            Some(stored) => merged.push(stored),
            None if row.id.is_none() => merged.push(row.clone()),
            None => {}
        }
    }
    merged.extend(remaining.into_iter().flatten());
    merged
}

/// Lines stored nutrition entries up with stored category rows.
///
/// Entries are matched by row key, so rows storage still holds in an older
/// state, or in another order, keep their own feed data. Records written
/// without keys fall back to position.
pub fn align_stored_nutrition(
    mut record: NutritionRecord,
    rows: &[CategoryRow],
) -> NutritionRecord {
    let keys = std::mem::take(&mut record.entry_keys);
    if keys.is_empty() {
        record.resize(rows.len());
        return record;
    }

    let by_key: HashMap<Uuid, usize> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut aligned = NutritionRecord {
        grazing: Vec::with_capacity(rows.len()),
        ingredients: Vec::with_capacity(rows.len()),
        concentrates: Vec::with_capacity(rows.len()),
        additives: Vec::with_capacity(rows.len()),
        ..record.clone()
    };
    for row in rows {
        let slot = by_key.get(&row.row_key).copied();
        aligned.grazing.push(
            slot.and_then(|i| record.grazing.get(i).cloned())
                .unwrap_or_default(),
        );
        aligned.ingredients.push(
            slot.and_then(|i| record.ingredients.get(i).cloned())
                .unwrap_or_default(),
        );
        aligned.concentrates.push(
            slot.and_then(|i| record.concentrates.get(i).cloned())
                .unwrap_or_default(),
        );
        aligned.additives.push(
            slot.and_then(|i| record.additives.get(i).cloned())
                .unwrap_or_default(),
        );
    }
    aligned
}

/// Builds a row set straight from storage.
pub fn from_storage(
    batch_id: Uuid,
    categories: Vec<CategoryRow>,
    nutrition: Option<NutritionRecord>,
    waste: Vec<WasteRecord>,
) -> RowSet {
    let record = align_stored_nutrition(
        nutrition.unwrap_or_else(|| NutritionRecord::new(batch_id)),
        &categories,
    );

    let mut groups = reconcile_waste(batch_id, &[], &categories);
    for group in &mut groups {
        let stored: Vec<WasteRecord> = waste
            .iter()
            .filter(|r| r.category == group.category)
            .cloned()
            .collect();
        if !stored.is_empty() {
            group.records = stored;
        }
    }

    RowSet {
        categories,
        nutrition: record,
        waste: groups,
    }
}
