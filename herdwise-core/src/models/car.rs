use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::Entity;
use crate::store::MinimumRowsViolation;
use crate::validation;

/// Purchased animals of one category attributed to a land-registry (CAR) code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarAllocation {
    pub id: Option<Uuid>,
    pub category_id: Uuid,
    pub car_code: String,
    pub head_count: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CarAllocation {
    pub fn new(category_id: Uuid, car_code: impl Into<String>, head_count: u32) -> Self {
        Self {
            id: None,
            category_id,
            car_code: car_code.into(),
            head_count,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for CarAllocation {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn parent_id(&self) -> Uuid {
        self.category_id
    }

    fn set_parent_id(&mut self, parent: Uuid) {
        self.category_id = parent;
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarAllocationError {
    #[error("Category has no purchased animals to allocate")]
    NothingPurchased,

    #[error("Category must be saved before allocating CAR codes")]
    UnsavedCategory,

    #[error("Allocated {allocated} of {purchased} purchased animals")]
    Mismatch { allocated: u64, purchased: u32 },

    #[error("Every allocated row needs a CAR code")]
    MissingCode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationRow {
    pub car_code: String,
    pub head_count: u32,
}

/// Editable allocation of a category's purchased head count.
///
/// Always holds at least one row.
#[derive(Debug, Clone, PartialEq)]
pub struct CarAllocationDraft {
    pub category_id: Uuid,
    pub purchased: u32,
    rows: Vec<AllocationRow>,
}

impl CarAllocationDraft {
    pub fn new(category_id: Uuid, purchased: u32) -> Self {
        Self {
            category_id,
            purchased,
            rows: vec![AllocationRow::default()],
        }
    }

    /// Draft seeded from stored allocations.
    pub fn from_existing(category_id: Uuid, purchased: u32, existing: &[CarAllocation]) -> Self {
        let mut draft = Self::new(category_id, purchased);
        if !existing.is_empty() {
            draft.rows = existing
                .iter()
                .map(|a| AllocationRow {
                    car_code: a.car_code.clone(),
                    head_count: a.head_count,
                })
                .collect();
        }
        draft
    }

    pub fn rows(&self) -> &[AllocationRow] {
        &self.rows
    }

    pub fn add_row(&mut self) -> usize {
        self.rows.push(AllocationRow::default());
        self.rows.len() - 1
    }

    pub fn set_row(&mut self, index: usize, car_code: impl Into<String>, head_count: u32) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.car_code = car_code.into();
                row.head_count = head_count;
                true
            }
            None => false,
        }
    }

    /// Removes a row; `Ok(None)` when `index` is out of range.
    pub fn remove_row(
        &mut self,
        index: usize,
    ) -> Result<Option<AllocationRow>, MinimumRowsViolation> {
        if self.rows.len() <= 1 {
            return Err(MinimumRowsViolation {
                what: "CAR allocation",
                remaining: self.rows.len(),
            });
        }
        if index >= self.rows.len() {
            return Ok(None);
        }
        Ok(Some(self.rows.remove(index)))
    }

    /// Sum of the rows' head counts, widened so large counts cannot
    /// overflow.
    pub fn allocated(&self) -> u64 {
        self.rows.iter().map(|r| u64::from(r.head_count)).sum()
    }

    pub fn can_confirm(&self) -> bool {
        validation::allocation_matches(self.purchased, &self.rows)
    }

    /// Checks the draft and returns the allocations to persist.
    pub fn confirm(&self) -> Result<Vec<CarAllocation>, CarAllocationError> {
        if self.can_confirm() {
            return Ok(self.to_allocations());
        }
        let allocated = self.allocated();
        if allocated != u64::from(self.purchased) {
            return Err(CarAllocationError::Mismatch {
                allocated,
                purchased: self.purchased,
            });
        }
        Err(CarAllocationError::MissingCode)
    }

    /// Allocations to persist, skipping rows with no code and no animals.
    pub fn to_allocations(&self) -> Vec<CarAllocation> {
        self.rows
            .iter()
            .filter(|r| !r.car_code.trim().is_empty() || r.head_count > 0)
            .map(|r| CarAllocation::new(self.category_id, r.car_code.trim(), r.head_count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_follows_allocated_sum() {
        let mut draft = CarAllocationDraft::new(Uuid::new_v4(), 20);
        draft.set_row(0, "MT-5100102-A", 12);
        let second = draft.add_row();
        draft.set_row(second, "MT-5100102-B", 8);
        assert!(draft.can_confirm());

        draft.set_row(second, "MT-5100102-B", 5);
        assert_eq!(draft.allocated(), 17);
        assert!(!draft.can_confirm());
    }

    #[test]
    fn test_confirm_reports_large_sums_without_overflow() {
        let mut draft = CarAllocationDraft::new(Uuid::new_v4(), 20);
        draft.set_row(0, "A", 4_000_000_000);
        let second = draft.add_row();
        draft.set_row(second, "B", 1_000_000_000);

        assert_eq!(draft.allocated(), 5_000_000_000);
        assert_eq!(
            draft.confirm().unwrap_err(),
            CarAllocationError::Mismatch {
                allocated: 5_000_000_000,
                purchased: 20
            }
        );
    }

    #[test]
    fn test_last_row_cannot_be_removed() {
        let mut draft = CarAllocationDraft::new(Uuid::new_v4(), 5);
        assert!(draft.remove_row(0).is_err());
        assert_eq!(draft.rows().len(), 1);

        draft.add_row();
        assert!(draft.remove_row(4).unwrap().is_none());
        assert!(draft.remove_row(1).unwrap().is_some());
        assert_eq!(draft.rows().len(), 1);
    }

    #[test]
    fn test_from_existing_keeps_stored_rows() {
        let category = Uuid::new_v4();
        let existing = vec![
            CarAllocation::new(category, "A", 3),
            CarAllocation::new(category, "B", 2),
        ];
        let draft = CarAllocationDraft::from_existing(category, 5, &existing);
        assert_eq!(draft.rows().len(), 2);
        assert!(draft.can_confirm());
    }

    #[test]
    fn test_confirm_reports_mismatch() {
        let mut draft = CarAllocationDraft::new(Uuid::new_v4(), 20);
        draft.set_row(0, "A", 17);
        assert_eq!(
            draft.confirm().unwrap_err(),
            CarAllocationError::Mismatch {
                allocated: 17,
                purchased: 20
            }
        );

        draft.set_row(0, "", 20);
        assert_eq!(draft.confirm().unwrap_err(), CarAllocationError::MissingCode);

        draft.set_row(0, " A ", 20);
        let allocations = draft.confirm().unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].car_code, "A");
    }
}
