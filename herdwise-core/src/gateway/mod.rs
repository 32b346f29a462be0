//! Persistence gateway contract.
//!
//! The core never talks to storage directly. Each entity type is reached
//! through a [`Repository`] with the same four operations:
//!
//! - `create(parent, payload)` assigns identity and timestamps
//! - `list_by_parent(parent)` returns children ordered by position
//! - `update(id, payload)` overwrites the stored payload
//! - `delete(id)` removes the entity (and, for batches, its children)
//!
//! Journeys are looked up by owner through [`JourneyRepository`].
//! [`Persistence`] bundles one repository per entity type.

mod error;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Batch, CarAllocation, CategoryRow, Journey, NutritionRecord, WasteRecord};

pub use error::{GatewayError, GatewayResult};

/// A record the gateway can store under a parent.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<Uuid>;
    fn assign_id(&mut self, id: Uuid);
    fn parent_id(&self) -> Uuid;
    fn set_parent_id(&mut self, parent: Uuid);
    /// Sort key within the parent.
    fn position(&self) -> i64 {
        0
    }
    /// Sets `updated_at`, and `created_at` if unset.
    fn stamp(&mut self, now: DateTime<Utc>);
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn create(&self, parent: Uuid, payload: &T) -> GatewayResult<T>;
    async fn list_by_parent(&self, parent: Uuid) -> GatewayResult<Vec<T>>;
    async fn update(&self, id: Uuid, payload: &T) -> GatewayResult<T>;
    async fn delete(&self, id: Uuid) -> GatewayResult<()>;
}

#[async_trait]
pub trait JourneyRepository: Send + Sync {
    async fn find_by_owner(&self, owner: &str) -> GatewayResult<Option<Journey>>;
    /// Inserts or replaces the journey.
    async fn save(&self, journey: &Journey) -> GatewayResult<Journey>;
}

/// One repository per entity type.
#[derive(Clone)]
pub struct Persistence {
    pub journeys: Arc<dyn JourneyRepository>,
    pub batches: Arc<dyn Repository<Batch>>,
    pub categories: Arc<dyn Repository<CategoryRow>>,
    pub nutrition: Arc<dyn Repository<NutritionRecord>>,
    pub waste: Arc<dyn Repository<WasteRecord>>,
    pub car: Arc<dyn Repository<CarAllocation>>,
}

impl Persistence {
    /// Builds the bundle from a single backend that serves every entity.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: JourneyRepository
            + Repository<Batch>
            + Repository<CategoryRow>
            + Repository<NutritionRecord>
            + Repository<WasteRecord>
            + Repository<CarAllocation>
            + 'static,
    {
        Self {
            journeys: backend.clone(),
            batches: backend.clone(),
            categories: backend.clone(),
            nutrition: backend.clone(),
            waste: backend.clone(),
            car: backend,
        }
    }
}
