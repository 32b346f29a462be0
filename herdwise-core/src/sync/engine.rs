use tracing::{debug, info};
use uuid::Uuid;

use super::error::SyncError;
use super::reconcile::{align_stored_nutrition, from_storage, merge_fresh, reconcile};
use crate::gateway::{GatewayResult, Persistence};
use crate::models::{Batch, CategoryRow};
use crate::store::{MinimumRowsViolation, RowSet, RowStore, StoreError};

/// Keeps the row store consistent with storage after structural changes.
///
/// Every reconciliation starts from a fresh read, so stale in-flight writes
/// are corrected by the next pass.
#[derive(Clone)]
pub struct SyncEngine {
    persistence: Persistence,
}

impl SyncEngine {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    /// Replaces a batch's rows with what storage holds.
    pub async fn load(&self, store: &mut RowStore, batch: &Batch) -> GatewayResult<()> {
        let Some(id) = batch.id else {
            store.open(batch.handle);
            return Ok(());
        };

        let (categories, nutrition, waste) = futures::try_join!(
            self.persistence.categories.list_by_parent(id),
            self.persistence.nutrition.list_by_parent(id),
            self.persistence.waste.list_by_parent(id),
        )?;
        debug!(
            batch = %batch.name,
            categories = categories.len(),
            waste = waste.len(),
            "loaded batch rows"
        );

        let set = if categories.is_empty() {
            let mut set = RowSet::with_blank_row(id);
            if let Some(record) = nutrition.into_iter().next() {
                set.nutrition = align_stored_nutrition(record, &set.categories);
            }
            set
        } else {
            from_storage(id, categories, nutrition.into_iter().next(), waste)
        };
        store.replace_all(batch.handle, set);
        Ok(())
    }

    /// Re-reads the batch's category rows and rebuilds dependent rows.
    pub async fn refresh_categories(
        &self,
        store: &mut RowStore,
        batch: &Batch,
    ) -> GatewayResult<()> {
        let Some(id) = batch.id else {
            store.open(batch.handle);
            return Ok(());
        };
        let fresh = self.persistence.categories.list_by_parent(id).await?;
        let previous = self.snapshot(store, batch.handle);
        self.apply(store, batch.handle, &previous, fresh);
        Ok(())
    }

    /// Folds a fresh category read into the store, mapping dependent rows
    /// from `previous` by category identity.
    pub fn apply(
        &self,
        store: &mut RowStore,
        handle: Uuid,
        previous: &RowSet,
        fresh: Vec<CategoryRow>,
    ) {
        let current = store.get(handle).cloned().unwrap_or_else(|| previous.clone());
        let mut merged = merge_fresh(&current.categories, fresh);
        if merged.is_empty() {
            merged.push(CategoryRow::blank(handle));
        }
        let mut next = reconcile(previous, merged);
        // Header fields and ids come from the current set.
        next.nutrition.id = current.nutrition.id.or(next.nutrition.id);
        next.nutrition.includes_feed_data = current.nutrition.includes_feed_data;
        next.nutrition.production_system = current.nutrition.production_system;
        store.replace_all(handle, next);
    }

    /// Removes a category row, from storage too when it was saved.
    ///
    /// The last row of a batch is refused before any storage call.
    pub async fn remove_category(
        &self,
        store: &mut RowStore,
        batch: &Batch,
        index: usize,
    ) -> Result<CategoryRow, SyncError> {
        let previous = store
            .get(batch.handle)
            .cloned()
            .ok_or(StoreError::UnknownBatch(batch.handle))?;
        let len = previous.len();
        if index >= len {
            return Err(StoreError::RowOutOfRange { index, len }.into());
        }
        if len <= 1 {
            return Err(StoreError::from(MinimumRowsViolation {
                what: "category",
                remaining: len,
            })
            .into());
        }

        let target = previous.categories[index].clone();
        if let Some(id) = target.id {
            self.persistence.categories.delete(id).await?;
            for allocation in self.persistence.car.list_by_parent(id).await? {
                if let Some(allocation_id) = allocation.id {
                    self.persistence.car.delete(allocation_id).await?;
                }
            }
        }
        let removed = store.remove_row(batch.handle, index)?;

        match batch.id {
            Some(batch_id) => {
                let fresh = self.persistence.categories.list_by_parent(batch_id).await?;
                self.apply(store, batch.handle, &previous, fresh);
            }
            None => {
                let rows = store
                    .get_rows(batch.handle)
                    .map(|rows| rows.to_vec())
                    .unwrap_or_default();
                store.replace_all(batch.handle, reconcile(&previous, rows));
            }
        }
        info!(batch = %batch.name, category = %removed.label(), "removed category row");
        Ok(removed)
    }

    /// Runs reconciliation for every batch without touching storage.
    pub fn reconcile_local(&self, store: &mut RowStore, batches: &[Batch]) {
        for batch in batches {
            if let Some(previous) = store.get(batch.handle).cloned() {
                let rows = previous.categories.clone();
                store.replace_all(batch.handle, reconcile(&previous, rows));
            }
        }
    }

    pub fn snapshot(&self, store: &RowStore, handle: Uuid) -> RowSet {
        store
            .get(handle)
            .cloned()
            .unwrap_or_else(|| RowSet::with_blank_row(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::gateway::memory::InMemoryGateway;
    use crate::gateway::Repository;
    use crate::models::{CategoryType, IngredientEntry};

    async fn stored_batch(gateway: &Arc<InMemoryGateway>) -> Batch {
        let batch = Batch::pending(Uuid::nil(), "Lote 1", 0);
        Repository::<Batch>::create(gateway.as_ref(), Uuid::new_v4(), &batch)
            .await
            .unwrap()
            .loaded()
    }

    async fn stored_row(gateway: &Arc<InMemoryGateway>, batch: Uuid, code: &str, pos: u32) {
        let mut row = CategoryRow::blank(batch)
            .with_type(CategoryType::lookup(code).unwrap())
            .with_stock(10, 250.0, 12);
        row.position = pos;
        Repository::<CategoryRow>::create(gateway.as_ref(), batch, &row)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_pending_batch_opens_blank_set() {
        let gateway = Arc::new(InMemoryGateway::new());
        let engine = SyncEngine::new(Persistence::from_backend(gateway));
        let mut store = RowStore::new();
        let batch = Batch::pending(Uuid::new_v4(), "Lote 1", 0);

        engine.load(&mut store, &batch).await.unwrap();
        assert_eq!(store.get_rows(batch.handle).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_category_keeps_other_nutrition() {
        let gateway = Arc::new(InMemoryGateway::new());
        let batch = stored_batch(&gateway).await;
        let id = batch.id.unwrap();
        stored_row(&gateway, id, "boi", 0).await;
        stored_row(&gateway, id, "touro", 1).await;

        let engine = SyncEngine::new(Persistence::from_backend(gateway.clone()));
        let mut store = RowStore::new();
        engine.load(&mut store, &batch).await.unwrap();

        let mut record = store.get(batch.handle).unwrap().nutrition.clone();
        record.ingredients[1] = IngredientEntry {
            name: "farelo".to_string(),
            ..Default::default()
        };
        store.upsert_nutrition(batch.handle, record).unwrap();

        engine.remove_category(&mut store, &batch, 0).await.unwrap();
        let set = store.get(batch.handle).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.categories[0].identity(), Some("touro"));
        assert_eq!(set.nutrition.ingredients[0].name, "farelo");
        assert_eq!(gateway.row_counts()[1], 1);
    }

    #[tokio::test]
    async fn test_remove_last_category_never_reaches_storage() {
        let gateway = Arc::new(InMemoryGateway::new());
        let batch = stored_batch(&gateway).await;
        stored_row(&gateway, batch.id.unwrap(), "boi", 0).await;

        let engine = SyncEngine::new(Persistence::from_backend(gateway.clone()));
        let mut store = RowStore::new();
        engine.load(&mut store, &batch).await.unwrap();
        let before = gateway.mutations();

        let err = engine.remove_category(&mut store, &batch, 0).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::MinimumRows(_))));
        assert_eq!(gateway.mutations(), before);
    }

    #[tokio::test]
    async fn test_refresh_keeps_unsaved_rows() {
        let gateway = Arc::new(InMemoryGateway::new());
        let batch = stored_batch(&gateway).await;
        stored_row(&gateway, batch.id.unwrap(), "boi", 0).await;

        let engine = SyncEngine::new(Persistence::from_backend(gateway));
        let mut store = RowStore::new();
        engine.load(&mut store, &batch).await.unwrap();
        store.add_row(batch.handle).unwrap();

        engine.refresh_categories(&mut store, &batch).await.unwrap();
        let set = store.get(batch.handle).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.nutrition.is_aligned_with(2));
    }
}
