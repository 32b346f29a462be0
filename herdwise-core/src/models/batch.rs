use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::gateway::Entity;

pub const BATCH_NAME_MIN: usize = 3;
pub const BATCH_NAME_MAX: usize = 100;

/// A named grouping of animals within a journey.
///
/// `handle` is minted locally and never changes, so a batch can be edited
/// before the gateway assigns `id`. Batches loaded from storage use their
/// server id as handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub id: Option<Uuid>,
    #[serde(skip, default = "Uuid::new_v4")]
    pub handle: Uuid,
    pub journey_id: Uuid,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// A batch that has not been persisted yet.
    pub fn pending(journey_id: Uuid, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: None,
            handle: Uuid::new_v4(),
            journey_id,
            name: name.into(),
            order,
            notes: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Re-keys a batch read back from storage so its handle is its id.
    pub fn loaded(mut self) -> Self {
        if let Some(id) = self.id {
            self.handle = id;
        }
        self
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }

    pub fn has_valid_name(&self) -> bool {
        let len = self.name.trim().chars().count();
        (BATCH_NAME_MIN..=BATCH_NAME_MAX).contains(&len)
    }
}

impl Entity for Batch {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn parent_id(&self) -> Uuid {
        self.journey_id
    }

    fn set_parent_id(&mut self, parent: Uuid) {
        self.journey_id = parent;
    }

    fn position(&self) -> i64 {
        i64::from(self.order)
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_pending() {
            write!(f, " (not saved)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_batch_has_handle_but_no_id() {
        let batch = Batch::pending(Uuid::new_v4(), "Lote 1", 0);
        assert!(batch.is_pending());
        assert_ne!(batch.handle, Uuid::nil());
        assert_eq!(format!("{}", batch), "Lote 1 (not saved)");
    }

    #[test]
    fn test_name_length_rules() {
        let journey = Uuid::new_v4();
        assert!(!Batch::pending(journey, "ab", 0).has_valid_name());
        assert!(!Batch::pending(journey, "  ab  ", 0).has_valid_name());
        assert!(Batch::pending(journey, "abc", 0).has_valid_name());
        assert!(Batch::pending(journey, "x".repeat(100), 0).has_valid_name());
        assert!(!Batch::pending(journey, "x".repeat(101), 0).has_valid_name());
    }

    #[test]
    fn test_assign_id_keeps_handle() {
        let mut batch = Batch::pending(Uuid::new_v4(), "Lote 1", 0);
        let handle = batch.handle;
        let id = Uuid::new_v4();
        batch.assign_id(id);
        assert_eq!(batch.id, Some(id));
        assert_eq!(batch.handle, handle);
        assert!(!batch.is_pending());
    }

    #[test]
    fn test_loaded_batch_uses_id_as_handle() {
        let mut batch = Batch::pending(Uuid::new_v4(), "Lote 1", 0);
        let id = Uuid::new_v4();
        batch.assign_id(id);
        let loaded = batch.loaded();
        assert_eq!(loaded.handle, id);
    }
}
