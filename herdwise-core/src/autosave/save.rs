use std::collections::HashSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, GatewayResult, Persistence};
use crate::models::{Batch, CategoryRow, HerdTab, NutritionRecord, WasteGroup};
use crate::store::RowSet;
use crate::validation::is_category_row_complete;

/// Which parts of a batch a flush writes.
///
/// The batch itself and its complete category rows are written by every
/// scope, since nutrition and waste records hang off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveScope {
    Information,
    Nutrition,
    Management,
    All,
}

impl SaveScope {
    pub fn for_tab(tab: HerdTab) -> Self {
        match tab {
            HerdTab::Information => SaveScope::Information,
            HerdTab::Nutrition => SaveScope::Nutrition,
            HerdTab::Management => SaveScope::Management,
        }
    }

    fn nutrition(self) -> bool {
        matches!(self, SaveScope::Nutrition | SaveScope::All)
    }

    fn waste(self) -> bool {
        matches!(self, SaveScope::Management | SaveScope::All)
    }
}

/// What storage holds for a batch after its save sequence.
#[derive(Debug, Clone)]
pub(crate) struct SavedBatch {
    pub batch: Batch,
    pub created: bool,
    pub categories: Vec<CategoryRow>,
    pub nutrition: Option<NutritionRecord>,
    pub waste: Option<Vec<WasteGroup>>,
}

/// Nutrition as stored: every entry tagged with its category's row key.
///
/// Rows that are not saved yet keep their entries too; loading ignores
/// keys storage has no row for.
fn stored_nutrition(set: &RowSet) -> NutritionRecord {
    let mut record = set.nutrition.for_storage();
    if record.includes_feed_data {
        record.entry_keys = set.categories.iter().map(|r| r.row_key).collect();
    }
    record
}

/// Saves one batch: batch, then categories, then nutrition, then waste.
///
/// Returns `Ok(None)` when a pending batch has no valid name yet.
pub(crate) async fn save_batch(
    persistence: &Persistence,
    journey_id: Uuid,
    scope: SaveScope,
    batch: Batch,
    set: Option<RowSet>,
) -> GatewayResult<Option<SavedBatch>> {
    let (batch, created) = match batch.id {
        Some(_) => (batch, false),
        None if !batch.has_valid_name() => {
            warn!(batch = %batch.name, "skipping pending batch without a valid name");
            return Ok(None);
        }
        None => {
            let mut stored = persistence.batches.create(journey_id, &batch).await?;
            stored.handle = batch.handle;
            debug!(batch = %stored.name, "created batch");
            (stored, true)
        }
    };
    let batch_id = batch
        .id
        .ok_or_else(|| GatewayError::Storage(format!("batch {} has no id", batch.name)))?;

    let Some(set) = set else {
        return Ok(Some(SavedBatch {
            batch,
            created,
            categories: Vec::new(),
            nutrition: None,
            waste: None,
        }));
    };

    upsert_categories(persistence, batch_id, &set.categories).await?;

    let nutrition = if scope.nutrition() {
        Some(upsert_nutrition(persistence, batch_id, &set).await?)
    } else {
        None
    };

    let waste = if scope.waste() {
        Some(upsert_waste(persistence, batch_id, &set.waste).await?)
    } else {
        None
    };

    let categories = persistence.categories.list_by_parent(batch_id).await?;
    Ok(Some(SavedBatch {
        batch,
        created,
        categories,
        nutrition,
        waste,
    }))
}

/// Matches complete rows to stored rows by row key.
async fn upsert_categories(
    persistence: &Persistence,
    batch_id: Uuid,
    rows: &[CategoryRow],
) -> GatewayResult<()> {
    let stored = persistence.categories.list_by_parent(batch_id).await?;
    for row in rows.iter().filter(|r| is_category_row_complete(r)) {
        match stored.iter().find(|s| s.row_key == row.row_key) {
            Some(existing) if existing.same_content(row) => {}
            Some(existing) => {
                if let Some(id) = existing.id {
                    persistence.categories.update(id, row).await?;
                    debug!(category = %row.label(), "updated category row");
                }
            }
            None => {
                persistence.categories.create(batch_id, row).await?;
                debug!(category = %row.label(), "created category row");
            }
        }
    }
    Ok(())
}

async fn upsert_nutrition(
    persistence: &Persistence,
    batch_id: Uuid,
    set: &RowSet,
) -> GatewayResult<NutritionRecord> {
    let record = stored_nutrition(set);
    let existing = persistence
        .nutrition
        .list_by_parent(batch_id)
        .await?
        .into_iter()
        .next();
    match existing {
        Some(stored) if stored.same_content(&record) => Ok(stored),
        Some(stored) => match stored.id {
            Some(id) => persistence.nutrition.update(id, &record).await,
            None => Ok(stored),
        },
        None => persistence.nutrition.create(batch_id, &record).await,
    }
}

/// Creates new records, updates changed ones, and deletes stored records
/// the batch no longer has.
async fn upsert_waste(
    persistence: &Persistence,
    batch_id: Uuid,
    groups: &[WasteGroup],
) -> GatewayResult<Vec<WasteGroup>> {
    let stored = persistence.waste.list_by_parent(batch_id).await?;
    let mut kept = HashSet::new();
    let mut saved_groups = Vec::with_capacity(groups.len());

    for group in groups {
        let mut records = Vec::with_capacity(group.records.len());
        for record in &group.records {
            let existing = record
                .id
                .and_then(|id| stored.iter().find(|s| s.id == Some(id)));
            let saved = match existing {
                Some(existing) if existing.same_content(record) => existing.clone(),
                Some(existing) => match existing.id {
                    Some(id) => persistence.waste.update(id, record).await?,
                    None => existing.clone(),
                },
                None => persistence.waste.create(batch_id, record).await?,
            };
            if let Some(id) = saved.id {
                kept.insert(id);
            }
            records.push(saved);
        }
        saved_groups.push(WasteGroup {
            records,
            ..group.clone()
        });
    }

    for orphan in stored.iter().filter_map(|s| s.id).filter(|id| !kept.contains(id)) {
        persistence.waste.delete(orphan).await?;
    }
    Ok(saved_groups)
}
