//! In-memory persistence backend.
//!
//! Serves every entity type from process memory. Used by the test suite and
//! by callers that embed the wizard without a database.
//!
//! ## Limitations
//!
//! - No persistence: all state is lost when the value is dropped
//! - No cascading deletes: callers remove children explicitly

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Entity, GatewayError, GatewayResult, JourneyRepository, Repository};
use crate::models::{Batch, CarAllocation, CategoryRow, Journey, NutritionRecord, WasteRecord};

fn poison_err<T>(_: PoisonError<T>) -> GatewayError {
    GatewayError::Storage("lock poisoned".to_string())
}

/// Rows of one entity type, kept in insertion order.
#[derive(Debug)]
struct Table<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> Table<T> {
    fn create(&self, parent: Uuid, payload: &T) -> GatewayResult<T> {
        let mut stored = payload.clone();
        stored.assign_id(Uuid::new_v4());
        stored.set_parent_id(parent);
        stored.stamp(Utc::now());
        self.rows.write().map_err(poison_err)?.push(stored.clone());
        Ok(stored)
    }

    fn list_by_parent(&self, parent: Uuid) -> GatewayResult<Vec<T>> {
        let mut rows: Vec<T> = self
            .rows
            .read()
            .map_err(poison_err)?
            .iter()
            .filter(|r| r.parent_id() == parent)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.position());
        Ok(rows)
    }

    fn update(&self, entity: &'static str, id: Uuid, payload: &T) -> GatewayResult<T> {
        let mut rows = self.rows.write().map_err(poison_err)?;
        let slot = rows
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or(GatewayError::NotFound { entity, id })?;
        let mut stored = payload.clone();
        stored.assign_id(id);
        stored.set_parent_id(slot.parent_id());
        stored.stamp(Utc::now());
        *slot = stored.clone();
        Ok(stored)
    }

    fn delete(&self, id: Uuid) -> GatewayResult<()> {
        self.rows
            .write()
            .map_err(poison_err)?
            .retain(|r| r.id() != Some(id));
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }
}

/// Mutation counters, for asserting how much a save actually wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationCounts {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl MutationCounts {
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGateway {
    journeys: RwLock<HashMap<String, Journey>>,
    batches: Table<Batch>,
    categories: Table<CategoryRow>,
    nutrition: Table<NutritionRecord>,
    waste: Table<WasteRecord>,
    car: Table<CarAllocation>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutations(&self) -> MutationCounts {
        MutationCounts {
            creates: self.creates.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Makes every subsequent write fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored rows per table: batches, categories, nutrition, waste, car.
    pub fn row_counts(&self) -> [usize; 5] {
        [
            self.batches.len(),
            self.categories.len(),
            self.nutrition.len(),
            self.waste.len(),
            self.car.len(),
        ]
    }

    fn check_writable(&self) -> GatewayResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage("write rejected".to_string()));
        }
        Ok(())
    }
}

macro_rules! table_repository {
    ($ty:ty, $field:ident, $entity:literal) => {
        #[async_trait]
        impl Repository<$ty> for InMemoryGateway {
            async fn create(&self, parent: Uuid, payload: &$ty) -> GatewayResult<$ty> {
                self.check_writable()?;
                let stored = self.$field.create(parent, payload)?;
                self.creates.fetch_add(1, Ordering::SeqCst);
                Ok(stored)
            }

            async fn list_by_parent(&self, parent: Uuid) -> GatewayResult<Vec<$ty>> {
                self.$field.list_by_parent(parent)
            }

            async fn update(&self, id: Uuid, payload: &$ty) -> GatewayResult<$ty> {
                self.check_writable()?;
                let stored = self.$field.update($entity, id, payload)?;
                self.updates.fetch_add(1, Ordering::SeqCst);
                Ok(stored)
            }

            async fn delete(&self, id: Uuid) -> GatewayResult<()> {
                self.check_writable()?;
                self.$field.delete(id)?;
                self.deletes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    };
}

table_repository!(Batch, batches, "batch");
table_repository!(CategoryRow, categories, "category");
table_repository!(NutritionRecord, nutrition, "nutrition record");
table_repository!(WasteRecord, waste, "waste record");
table_repository!(CarAllocation, car, "CAR allocation");

#[async_trait]
impl JourneyRepository for InMemoryGateway {
    async fn find_by_owner(&self, owner: &str) -> GatewayResult<Option<Journey>> {
        Ok(self.journeys.read().map_err(poison_err)?.get(owner).cloned())
    }

    async fn save(&self, journey: &Journey) -> GatewayResult<Journey> {
        self.check_writable()?;
        self.journeys
            .write()
            .map_err(poison_err)?
            .insert(journey.owner.clone(), journey.clone());
        Ok(journey.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_identity_and_parent() {
        let gateway = InMemoryGateway::new();
        let journey = Uuid::new_v4();
        let batch = Batch::pending(Uuid::nil(), "Lote 1", 0);

        let stored = Repository::<Batch>::create(&gateway, journey, &batch)
            .await
            .unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.journey_id, journey);
        assert!(stored.created_at.is_some());

        let listed = Repository::<Batch>::list_by_parent(&gateway, journey)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(gateway.mutations().creates, 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_position() {
        let gateway = InMemoryGateway::new();
        let batch = Uuid::new_v4();
        for position in [2, 0, 1] {
            let mut row = CategoryRow::blank(batch);
            row.position = position;
            Repository::<CategoryRow>::create(&gateway, batch, &row)
                .await
                .unwrap();
        }
        let rows = Repository::<CategoryRow>::list_by_parent(&gateway, batch)
            .await
            .unwrap();
        let positions: Vec<u32> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let gateway = InMemoryGateway::new();
        let row = WasteRecord::blank(Uuid::new_v4(), "boi");
        let err = Repository::<WasteRecord>::update(&gateway, Uuid::new_v4(), &row)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_writes_are_not_counted() {
        let gateway = InMemoryGateway::new();
        gateway.set_fail_writes(true);
        let batch = Batch::pending(Uuid::nil(), "Lote 1", 0);
        assert!(Repository::<Batch>::create(&gateway, Uuid::new_v4(), &batch)
            .await
            .is_err());
        assert_eq!(gateway.mutations().total(), 0);
    }
}
