use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use herdwise_core::models::{
    Batch, CarAllocation, CategoryRow, Journey, NutritionRecord, WasteRecord,
};
use herdwise_core::{Entity, GatewayError, GatewayResult, JourneyRepository, Repository};

/// Entity types stored in their own table as a JSON payload.
pub trait Stored: Entity + Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const NAME: &'static str;
}

impl Stored for Batch {
    const TABLE: &'static str = "batches";
    const NAME: &'static str = "batch";
}

impl Stored for CategoryRow {
    const TABLE: &'static str = "categories";
    const NAME: &'static str = "category";
}

impl Stored for NutritionRecord {
    const TABLE: &'static str = "nutrition_records";
    const NAME: &'static str = "nutrition record";
}

impl Stored for WasteRecord {
    const TABLE: &'static str = "waste_records";
    const NAME: &'static str = "waste record";
}

impl Stored for CarAllocation {
    const TABLE: &'static str = "car_allocations";
    const NAME: &'static str = "CAR allocation";
}

fn storage_err(e: sqlx::Error) -> GatewayError {
    GatewayError::Storage(e.to_string())
}

/// SQLite persistence. Deleting a parent cascades to its children.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn parent_of<T: Stored>(&self, id: Uuid) -> GatewayResult<Uuid> {
        let row: Option<(String,)> =
            sqlx::query_as(&format!("SELECT parent_id FROM {} WHERE id = ?", T::TABLE))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        let (parent,) = row.ok_or(GatewayError::NotFound {
            entity: T::NAME,
            id,
        })?;
        Uuid::parse_str(&parent).map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl<T: Stored> Repository<T> for SqliteGateway {
    async fn create(&self, parent: Uuid, payload: &T) -> GatewayResult<T> {
        let mut stored = payload.clone();
        let id = Uuid::new_v4();
        let now = Utc::now();
        stored.assign_id(id);
        stored.set_parent_id(parent);
        stored.stamp(now);
        let json = serde_json::to_string(&stored)?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, parent_id, position, payload, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            T::TABLE
        ))
        .bind(id.to_string())
        .bind(parent.to_string())
        .bind(stored.position())
        .bind(&json)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(stored)
    }

    async fn list_by_parent(&self, parent: Uuid) -> GatewayResult<Vec<T>> {
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT payload FROM {} WHERE parent_id = ? ORDER BY position, rowid",
            T::TABLE
        ))
        .bind(parent.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|(json,)| serde_json::from_str(&json).map_err(GatewayError::from))
            .collect()
    }

    async fn update(&self, id: Uuid, payload: &T) -> GatewayResult<T> {
        let parent = self.parent_of::<T>(id).await?;
        let mut stored = payload.clone();
        let now = Utc::now();
        stored.assign_id(id);
        stored.set_parent_id(parent);
        stored.stamp(now);
        let json = serde_json::to_string(&stored)?;

        sqlx::query(&format!(
            "UPDATE {} SET position = ?, payload = ?, updated_at = ? WHERE id = ?",
            T::TABLE
        ))
        .bind(stored.position())
        .bind(&json)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> GatewayResult<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::TABLE))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl JourneyRepository for SqliteGateway {
    async fn find_by_owner(&self, owner: &str) -> GatewayResult<Option<Journey>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM journeys WHERE owner = ?")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        row.map(|(json,)| serde_json::from_str(&json).map_err(GatewayError::from))
            .transpose()
    }

    async fn save(&self, journey: &Journey) -> GatewayResult<Journey> {
        let json = serde_json::to_string(journey)?;
        sqlx::query(
            r#"
            INSERT INTO journeys (id, owner, payload, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner = excluded.owner,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(journey.id.to_string())
        .bind(&journey.owner)
        .bind(&json)
        .bind(journey.created_at.to_rfc3339())
        .bind(journey.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(journey.clone())
    }
}
