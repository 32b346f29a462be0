//! Edits to batches and their rows.

use tracing::{info, warn};
use uuid::Uuid;

use super::{Wizard, WizardError};
use crate::models::{
    Batch, CarAllocation, CarAllocationDraft, CarAllocationError, CategoryRow, ManagementType,
    NutritionRecord, WasteGroup, WasteRecord,
};
use crate::store::{MinimumRowsViolation, StoreError};
use crate::sync::{reconcile, SyncError};
use crate::validation::check_percentage_edit;

impl Wizard {
    /// Adds a batch that exists only locally until the next flush.
    ///
    /// Returns its handle.
    pub fn add_batch(&mut self, name: &str) -> Uuid {
        let order = self.batches.len() as u32;
        let batch = Batch::pending(self.journey.id, name.trim(), order);
        let handle = batch.handle;
        self.store.open(handle);
        self.batches.push(batch);
        self.note_edit();
        handle
    }

    /// Renames a batch. Stored batches are written immediately.
    pub async fn rename_batch(&mut self, handle: Uuid, name: &str) -> Result<(), WizardError> {
        let index = self.batch_index(handle)?;
        let mut batch = self.batches[index].clone();
        batch.name = name.trim().to_string();
        self.write_batch(index, batch).await
    }

    pub async fn set_batch_notes(&mut self, handle: Uuid, notes: &str) -> Result<(), WizardError> {
        let index = self.batch_index(handle)?;
        let batch = self.batches[index].clone().with_notes(notes);
        self.write_batch(index, batch).await
    }

    async fn write_batch(&mut self, index: usize, batch: Batch) -> Result<(), WizardError> {
        match batch.id {
            Some(id) => {
                if !batch.has_valid_name() {
                    return Err(WizardError::InvalidBatchName);
                }
                let mut stored = self.persistence.batches.update(id, &batch).await?;
                stored.handle = batch.handle;
                self.batches[index] = stored;
            }
            None => {
                self.batches[index] = batch;
                self.note_edit();
            }
        }
        Ok(())
    }

    /// Deletes a batch together with its categories, nutrition, waste and
    /// CAR records.
    pub async fn delete_batch(&mut self, handle: Uuid) -> Result<Batch, WizardError> {
        let index = self.batch_index(handle)?;
        if let Some(id) = self.batches[index].id {
            let persistence = &self.persistence;
            for category in persistence.categories.list_by_parent(id).await? {
                let Some(category_id) = category.id else {
                    continue;
                };
                for allocation in persistence.car.list_by_parent(category_id).await? {
                    if let Some(allocation_id) = allocation.id {
                        persistence.car.delete(allocation_id).await?;
                    }
                }
                persistence.categories.delete(category_id).await?;
            }
            for record in persistence.nutrition.list_by_parent(id).await? {
                if let Some(record_id) = record.id {
                    persistence.nutrition.delete(record_id).await?;
                }
            }
            for record in persistence.waste.list_by_parent(id).await? {
                if let Some(record_id) = record.id {
                    persistence.waste.delete(record_id).await?;
                }
            }
            persistence.batches.delete(id).await?;
        }

        let batch = self.batches.remove(index);
        self.store.remove_batch(handle);
        for (order, remaining) in self.batches.iter_mut().enumerate() {
            remaining.order = order as u32;
        }
        info!(batch = %batch.name, "deleted batch");
        self.notifier
            .success(&format!("Batch {} deleted", batch.name));
        Ok(batch)
    }

    /// Appends a blank category row. Returns its index.
    pub fn add_category_row(&mut self, handle: Uuid) -> Result<usize, WizardError> {
        let index = self.store.add_row(handle)?;
        self.note_edit();
        Ok(index)
    }

    /// Edits one category row in place.
    ///
    /// Dependent nutrition and waste rows are re-derived, so a re-typed row
    /// starts from defaults while other rows keep their data. A category type
    /// can appear only once per batch; an edit that repeats one is refused
    /// and nothing changes.
    pub fn edit_category_row<F>(
        &mut self,
        handle: Uuid,
        index: usize,
        edit: F,
    ) -> Result<(), WizardError>
    where
        F: FnOnce(&mut CategoryRow),
    {
        let previous = self
            .store
            .get(handle)
            .cloned()
            .ok_or(StoreError::UnknownBatch(handle))?;
        let len = previous.len();
        let mut row = previous
            .categories
            .get(index)
            .cloned()
            .ok_or(StoreError::RowOutOfRange { index, len })?;
        edit(&mut row);
        if let Some(identity) = row.identity() {
            let taken = previous
                .categories
                .iter()
                .enumerate()
                .any(|(i, other)| i != index && other.identity() == Some(identity));
            if taken {
                let err = WizardError::DuplicateCategory(identity.to_string());
                warn!(category = identity, "refused duplicate category type");
                self.notifier.warning(&err.to_string());
                return Err(err);
            }
        }
        self.store.upsert_one(handle, index, row)?;

        if let Some(rows) = self.store.get_rows(handle).map(|rows| rows.to_vec()) {
            self.store.replace_all(handle, reconcile(&previous, rows));
        }
        self.note_edit();
        Ok(())
    }

    /// Removes a category row, refusing to remove the last one.
    pub async fn remove_category_row(
        &mut self,
        handle: Uuid,
        index: usize,
    ) -> Result<CategoryRow, WizardError> {
        let batch = self.batches[self.batch_index(handle)?].clone();
        match self.engine.remove_category(&mut self.store, &batch, index).await {
            Ok(removed) => Ok(removed),
            Err(SyncError::Store(StoreError::MinimumRows(violation))) => {
                self.notifier.warning(&violation.to_string());
                Err(StoreError::MinimumRows(violation).into())
            }
            Err(err) => {
                self.notifier.error(&err.to_string());
                Err(err.into())
            }
        }
    }

    /// Edits the batch's nutrition record; the lists stay aligned with
    /// the category rows.
    pub fn edit_nutrition<F>(&mut self, handle: Uuid, edit: F) -> Result<(), WizardError>
    where
        F: FnOnce(&mut NutritionRecord),
    {
        let mut record = self
            .store
            .get(handle)
            .map(|set| set.nutrition.clone())
            .ok_or(StoreError::UnknownBatch(handle))?;
        edit(&mut record);
        self.store.upsert_nutrition(handle, record)?;
        self.note_edit();
        Ok(())
    }

    fn waste_group(&self, handle: Uuid, category: &str) -> Result<WasteGroup, WizardError> {
        self.store
            .get(handle)
            .ok_or(StoreError::UnknownBatch(handle))?
            .waste_group(category)
            .cloned()
            .ok_or_else(|| WizardError::UnknownWasteCategory(category.to_string()))
    }

    /// Adds a blank waste record to a category. Returns its index.
    pub fn add_waste_record(&mut self, handle: Uuid, category: &str) -> Result<usize, WizardError> {
        let mut group = self.waste_group(handle, category)?;
        group
            .records
            .push(WasteRecord::blank(handle, group.category.clone()));
        let index = group.records.len() - 1;
        self.store.upsert_waste_group(handle, group)?;
        self.note_edit();
        Ok(index)
    }

    /// Sets a waste record's share. A value that would push the batch past
    /// 100% is rejected and not applied.
    pub fn set_waste_percentage(
        &mut self,
        handle: Uuid,
        category: &str,
        index: usize,
        value: f64,
    ) -> Result<(), WizardError> {
        let batch = self.batches[self.batch_index(handle)?].clone();
        let mut group = self.waste_group(handle, category)?;
        let len = group.records.len();
        if index >= len {
            return Err(StoreError::RowOutOfRange { index, len }.into());
        }
        let groups = self
            .store
            .get(handle)
            .map(|set| set.waste.as_slice())
            .unwrap_or_default();
        if let Err(overflow) = check_percentage_edit(&batch, groups, category, index, value) {
            self.notifier.warning(&overflow.to_string());
            return Err(overflow.into());
        }
        group.records[index].percentage = value;
        self.store.upsert_waste_group(handle, group)?;
        self.note_edit();
        Ok(())
    }

    pub fn set_waste_type(
        &mut self,
        handle: Uuid,
        category: &str,
        index: usize,
        management_type: ManagementType,
    ) -> Result<(), WizardError> {
        let mut group = self.waste_group(handle, category)?;
        let len = group.records.len();
        let record = group
            .records
            .get_mut(index)
            .ok_or(StoreError::RowOutOfRange { index, len })?;
        record.management_type = Some(management_type);
        self.store.upsert_waste_group(handle, group)?;
        self.note_edit();
        Ok(())
    }

    /// Removes a waste record. A category always keeps at least one.
    pub fn remove_waste_record(
        &mut self,
        handle: Uuid,
        category: &str,
        index: usize,
    ) -> Result<WasteRecord, WizardError> {
        let mut group = self.waste_group(handle, category)?;
        let len = group.records.len();
        if len <= 1 {
            let violation = MinimumRowsViolation {
                what: "waste management",
                remaining: len,
            };
            self.notifier.warning(&violation.to_string());
            return Err(StoreError::from(violation).into());
        }
        if index >= len {
            return Err(StoreError::RowOutOfRange { index, len }.into());
        }
        let removed = group.records.remove(index);
        self.store.upsert_waste_group(handle, group)?;
        self.note_edit();
        Ok(removed)
    }

    /// Opens the CAR allocation draft for a saved category row.
    pub async fn open_car_allocation(
        &self,
        handle: Uuid,
        index: usize,
    ) -> Result<CarAllocationDraft, WizardError> {
        let rows = self
            .store
            .get_rows(handle)
            .ok_or(StoreError::UnknownBatch(handle))?;
        let row = rows.get(index).ok_or(StoreError::RowOutOfRange {
            index,
            len: rows.len(),
        })?;
        if row.purchased() == 0 {
            return Err(CarAllocationError::NothingPurchased.into());
        }
        let category_id = row.id.ok_or(CarAllocationError::UnsavedCategory)?;
        let existing = self.persistence.car.list_by_parent(category_id).await?;
        Ok(CarAllocationDraft::from_existing(
            category_id,
            row.purchased(),
            &existing,
        ))
    }

    /// Replaces the category's stored allocations with the draft's.
    pub async fn confirm_car_allocation(
        &self,
        draft: &CarAllocationDraft,
    ) -> Result<Vec<CarAllocation>, WizardError> {
        let allocations = match draft.confirm() {
            Ok(allocations) => allocations,
            Err(err) => {
                self.notifier.warning(&err.to_string());
                return Err(err.into());
            }
        };

        let car = &self.persistence.car;
        for existing in car.list_by_parent(draft.category_id).await? {
            if let Some(id) = existing.id {
                car.delete(id).await?;
            }
        }
        let mut stored = Vec::with_capacity(allocations.len());
        for allocation in &allocations {
            stored.push(car.create(draft.category_id, allocation).await?);
        }
        info!(
            category = %draft.category_id,
            rows = stored.len(),
            "confirmed CAR allocation"
        );
        self.notifier.success(&format!(
            "Allocated {} purchased animals across {} CAR codes",
            draft.allocated(),
            stored.len()
        ));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::gateway::memory::InMemoryGateway;
    use crate::gateway::Persistence;
    use crate::models::CategoryType;
    use crate::notify::{Level, RecordingNotifier};
    use crate::wizard::{Wizard, WizardError};
    use uuid::Uuid;

    async fn wizard() -> (Wizard, Arc<InMemoryGateway>, Arc<RecordingNotifier>) {
        let gateway = Arc::new(InMemoryGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let wizard = Wizard::open(
            Persistence::from_backend(gateway.clone()),
            notifier.clone(),
            "ana",
            "Inventário",
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        (wizard, gateway, notifier)
    }

    fn type_row(wizard: &mut Wizard, handle: Uuid, index: usize, code: &str) {
        wizard
            .edit_category_row(handle, index, |row| {
                row.category_type = CategoryType::lookup(code);
                row.on_farm_count = Some(10);
                row.average_weight_kg = Some(380.0);
                row.months_of_stay = Some(12);
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_edit_keeps_other_rows_nutrition() {
        let (mut wizard, _, _) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");
        wizard.add_category_row(handle).unwrap();
        type_row(&mut wizard, handle, 1, "novilha");
        wizard
            .edit_nutrition(handle, |n| n.ingredients[1].name = "feno".to_string())
            .unwrap();

        wizard
            .edit_category_row(handle, 1, |row| row.average_weight_kg = Some(300.0))
            .unwrap();
        assert_eq!(wizard.rows(handle).unwrap().nutrition.ingredients[1].name, "feno");

        type_row(&mut wizard, handle, 0, "touro");
        let set = wizard.rows(handle).unwrap();
        assert_eq!(set.nutrition.ingredients[1].name, "feno");
        assert!(set.waste_group("boi").is_none());
        assert!(set.waste_group("touro").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_category_type_is_refused() {
        let (mut wizard, _, notifier) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");
        wizard.add_category_row(handle).unwrap();
        type_row(&mut wizard, handle, 1, "touro");
        wizard
            .edit_nutrition(handle, |n| {
                n.ingredients[0].name = "silagem".to_string();
                n.ingredients[1].name = "feno".to_string();
            })
            .unwrap();

        let err = wizard
            .edit_category_row(handle, 1, |row| {
                row.category_type = CategoryType::lookup("boi");
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::DuplicateCategory(ref code) if code == "boi"));
        assert_eq!(notifier.count(Level::Warning), 1);

        let set = wizard.rows(handle).unwrap();
        assert_eq!(set.categories[1].identity(), Some("touro"));
        assert_eq!(set.nutrition.ingredients[1].name, "feno");

        // Editing the row's own type again is not a duplicate.
        type_row(&mut wizard, handle, 1, "touro");
        wizard
            .edit_category_row(handle, 1, |row| row.average_weight_kg = Some(300.0))
            .unwrap();
        let set = wizard.rows(handle).unwrap();
        assert_eq!(set.nutrition.ingredients[0].name, "silagem");
        assert_eq!(set.nutrition.ingredients[1].name, "feno");
    }

    #[tokio::test]
    async fn test_only_waste_record_cannot_be_removed() {
        let (mut wizard, _, notifier) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");

        let err = wizard.remove_waste_record(handle, "boi", 0).unwrap_err();
        assert!(matches!(err, WizardError::Store(_)));
        assert_eq!(wizard.rows(handle).unwrap().waste[0].records.len(), 1);
        assert_eq!(notifier.count(Level::Warning), 1);
    }

    #[tokio::test]
    async fn test_percentage_overflow_is_not_applied() {
        let (mut wizard, _, _) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");
        wizard.set_waste_percentage(handle, "boi", 0, 70.0).unwrap();
        let second = wizard.add_waste_record(handle, "boi").unwrap();

        let err = wizard
            .set_waste_percentage(handle, "boi", second, 40.0)
            .unwrap_err();
        assert!(matches!(err, WizardError::PercentageOverflow(_)));
        assert_eq!(wizard.rows(handle).unwrap().waste[0].records[second].percentage, 0.0);

        let err = wizard
            .set_waste_percentage(handle, "boi", second, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, WizardError::PercentageOverflow(_)));
        assert_eq!(wizard.rows(handle).unwrap().waste[0].records[second].percentage, 0.0);
    }

    #[tokio::test]
    async fn test_delete_batch_removes_children() {
        let (mut wizard, gateway, _) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");
        wizard.flush().await;
        assert_eq!(gateway.row_counts()[..2], [1, 1]);

        wizard.delete_batch(handle).await.unwrap();
        assert!(wizard.batches().is_empty());
        assert!(wizard.rows(handle).is_none());
        assert_eq!(gateway.row_counts(), [0; 5]);
    }

    #[tokio::test]
    async fn test_stored_batch_rename_validates() {
        let (mut wizard, _, _) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        wizard.flush().await;

        let err = wizard.rename_batch(handle, "L2").await.unwrap_err();
        assert!(matches!(err, WizardError::InvalidBatchName));
        wizard.rename_batch(handle, "Lote Norte").await.unwrap();
        assert_eq!(wizard.batch(handle).unwrap().name, "Lote Norte");
    }

    #[tokio::test]
    async fn test_car_allocation_needs_saved_purchase() {
        let (mut wizard, _, _) = wizard().await;
        let handle = wizard.add_batch("Lote 1");
        type_row(&mut wizard, handle, 0, "boi");

        let err = wizard.open_car_allocation(handle, 0).await.unwrap_err();
        assert!(matches!(err, WizardError::CarAllocation(_)));

        wizard
            .edit_category_row(handle, 0, |row| {
                row.purchased_count = Some(20);
                row.purchased_weight_kg = Some(250.0);
            })
            .unwrap();
        wizard.flush().await;

        let mut draft = wizard.open_car_allocation(handle, 0).await.unwrap();
        draft.set_row(0, "MT-1", 12);
        let second = draft.add_row();
        draft.set_row(second, "MT-2", 8);
        assert_eq!(wizard.confirm_car_allocation(&draft).await.unwrap().len(), 2);

        let reopened = wizard.open_car_allocation(handle, 0).await.unwrap();
        assert_eq!(reopened.rows().len(), 2);
        assert!(reopened.can_confirm());
    }
}
