//! Row model store.
//!
//! Holds the editable rows of every loaded batch, keyed by batch handle.
//! Each [`RowSet`] keeps the category rows together with the nutrition lists
//! aligned to them and the waste groups derived from them.
//!
//! Writers go through [`RowStore::upsert_one`] and friends for single edits,
//! and [`RowStore::replace_all`] for wholesale replacement after a sync.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{CategoryRow, NutritionRecord, WasteGroup};

/// Refusal to remove the last row of a list that must never be empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("At least one {what} row is required ({remaining} remaining)")]
pub struct MinimumRowsViolation {
    pub what: &'static str,
    pub remaining: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Batch {0} is not loaded")]
    UnknownBatch(Uuid),

    #[error("Row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    MinimumRows(#[from] MinimumRowsViolation),
}

/// Rows of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub categories: Vec<CategoryRow>,
    pub nutrition: NutritionRecord,
    pub waste: Vec<WasteGroup>,
}

impl RowSet {
    /// A set holding one blank category row.
    pub fn with_blank_row(parent: Uuid) -> Self {
        Self::from_categories(parent, vec![CategoryRow::blank(parent)])
    }

    /// A set whose nutrition lists are default-sized to `categories`.
    pub fn from_categories(parent: Uuid, categories: Vec<CategoryRow>) -> Self {
        let nutrition = NutritionRecord::sized(parent, categories.len());
        let mut set = Self {
            categories,
            nutrition,
            waste: Vec::new(),
        };
        set.renumber();
        set
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn waste_group(&self, category: &str) -> Option<&WasteGroup> {
        self.waste.iter().find(|g| g.category == category)
    }

    fn renumber(&mut self) {
        for (i, row) in self.categories.iter_mut().enumerate() {
            row.position = i as u32;
        }
    }
}

#[derive(Debug, Default)]
pub struct RowStore {
    sets: HashMap<Uuid, RowSet>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a batch with one blank row unless it is already loaded.
    pub fn open(&mut self, parent: Uuid) {
        self.sets
            .entry(parent)
            .or_insert_with(|| RowSet::with_blank_row(parent));
    }

    pub fn contains(&self, parent: Uuid) -> bool {
        self.sets.contains_key(&parent)
    }

    pub fn get(&self, parent: Uuid) -> Option<&RowSet> {
        self.sets.get(&parent)
    }

    pub fn get_rows(&self, parent: Uuid) -> Option<&[CategoryRow]> {
        self.sets.get(&parent).map(|s| s.categories.as_slice())
    }

    pub fn add_row(&mut self, parent: Uuid) -> Result<usize, StoreError> {
        let set = self.set_mut(parent)?;
        set.categories.push(CategoryRow::blank(parent));
        set.nutrition.resize(set.categories.len());
        set.renumber();
        Ok(set.categories.len() - 1)
    }

    /// Removes a category row and its aligned nutrition entries.
    ///
    /// The last row of a batch can't be removed.
    pub fn remove_row(&mut self, parent: Uuid, index: usize) -> Result<CategoryRow, StoreError> {
        let set = self.set_mut(parent)?;
        let len = set.categories.len();
        if index >= len {
            return Err(StoreError::RowOutOfRange { index, len });
        }
        if len <= 1 {
            return Err(MinimumRowsViolation {
                what: "category",
                remaining: len,
            }
            .into());
        }
        let removed = set.categories.remove(index);
        set.nutrition.remove_at(index);
        set.nutrition.resize(set.categories.len());
        set.renumber();
        Ok(removed)
    }

    /// Replaces the row at `index`, or appends when `index == len`.
    pub fn upsert_one(
        &mut self,
        parent: Uuid,
        index: usize,
        mut row: CategoryRow,
    ) -> Result<(), StoreError> {
        let set = self.set_mut(parent)?;
        let len = set.categories.len();
        row.normalize();
        match index.cmp(&len) {
            std::cmp::Ordering::Less => set.categories[index] = row,
            std::cmp::Ordering::Equal => {
                set.categories.push(row);
                set.nutrition.resize(set.categories.len());
            }
            std::cmp::Ordering::Greater => {
                return Err(StoreError::RowOutOfRange { index, len });
            }
        }
        set.renumber();
        Ok(())
    }

    /// Replaces the nutrition record, keeping it aligned with the rows.
    pub fn upsert_nutrition(
        &mut self,
        parent: Uuid,
        mut record: NutritionRecord,
    ) -> Result<(), StoreError> {
        let set = self.set_mut(parent)?;
        record.resize(set.categories.len());
        set.nutrition = record;
        Ok(())
    }

    /// Replaces the waste group with the same category.
    pub fn upsert_waste_group(&mut self, parent: Uuid, group: WasteGroup) -> Result<(), StoreError> {
        let set = self.set_mut(parent)?;
        match set.waste.iter_mut().find(|g| g.category == group.category) {
            Some(slot) => *slot = group,
            None => set.waste.push(group),
        }
        Ok(())
    }

    /// Swaps in a whole set at once.
    pub fn replace_all(&mut self, parent: Uuid, set: RowSet) {
        self.sets.insert(parent, set);
    }

    pub fn remove_batch(&mut self, parent: Uuid) -> Option<RowSet> {
        self.sets.remove(&parent)
    }

    fn set_mut(&mut self, parent: Uuid) -> Result<&mut RowSet, StoreError> {
        self.sets
            .get_mut(&parent)
            .ok_or(StoreError::UnknownBatch(parent))
    }
}
