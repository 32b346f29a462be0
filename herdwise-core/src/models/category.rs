use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category_type::CategoryType;
use crate::gateway::Entity;

/// Dairy-only production figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DairyFigures {
    pub pregnant_pct: Option<f64>,
    pub milk_yield_l_year: Option<f64>,
    pub fat_pct: Option<f64>,
    pub protein_pct: Option<f64>,
}

/// One animal category within a batch.
///
/// `row_key` is minted when the row is created and persisted with it, so a
/// row can be matched against its stored copy regardless of list position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: Option<Uuid>,
    pub row_key: Uuid,
    pub batch_id: Uuid,
    pub position: u32,
    pub category_type: Option<CategoryType>,
    pub on_farm_count: Option<u32>,
    pub average_weight_kg: Option<f64>,
    pub purchased_count: Option<u32>,
    pub purchased_weight_kg: Option<f64>,
    pub sold_count: Option<u32>,
    pub sold_weight_kg: Option<f64>,
    pub months_of_stay: Option<u32>,
    pub weaning_age_months: Option<f64>,
    #[serde(default)]
    pub dairy: DairyFigures,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CategoryRow {
    /// A blank row as added to the form list.
    pub fn blank(batch_id: Uuid) -> Self {
        Self {
            id: None,
            row_key: Uuid::new_v4(),
            batch_id,
            position: 0,
            category_type: None,
            on_farm_count: None,
            average_weight_kg: None,
            purchased_count: None,
            purchased_weight_kg: None,
            sold_count: None,
            sold_weight_kg: None,
            months_of_stay: None,
            weaning_age_months: None,
            dairy: DairyFigures::default(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_type(mut self, category_type: CategoryType) -> Self {
        self.category_type = Some(category_type);
        self
    }

    pub fn with_stock(mut self, on_farm: u32, average_weight_kg: f64, months: u32) -> Self {
        self.on_farm_count = Some(on_farm);
        self.average_weight_kg = Some(average_weight_kg);
        self.months_of_stay = Some(months);
        self
    }

    pub fn with_purchased(mut self, count: u32, weight_kg: Option<f64>) -> Self {
        self.purchased_count = Some(count);
        self.purchased_weight_kg = weight_kg;
        self
    }

    pub fn with_sold(mut self, count: u32, weight_kg: Option<f64>) -> Self {
        self.sold_count = Some(count);
        self.sold_weight_kg = weight_kg;
        self
    }

    pub fn with_weaning_age(mut self, months: f64) -> Self {
        self.weaning_age_months = Some(months);
        self
    }

    /// Identity used to carry nutrition and waste data across edits.
    pub fn identity(&self) -> Option<&str> {
        self.category_type.as_ref().map(|t| t.code.as_str())
    }

    pub fn label(&self) -> String {
        match &self.category_type {
            Some(t) => t.label.clone(),
            None => format!("Categoria {}", self.position + 1),
        }
    }

    pub fn purchased(&self) -> u32 {
        self.purchased_count.unwrap_or(0)
    }

    pub fn sold(&self) -> u32 {
        self.sold_count.unwrap_or(0)
    }

    pub fn on_farm(&self) -> u32 {
        self.on_farm_count.unwrap_or(0)
    }

    pub fn is_calf(&self) -> bool {
        self.category_type.as_ref().is_some_and(|t| t.is_calf())
    }

    pub fn is_dairy(&self) -> bool {
        self.category_type.as_ref().is_some_and(|t| t.is_dairy())
    }

    /// Clears fields that no longer apply to the row's counts and type.
    pub fn normalize(&mut self) {
        if self.purchased() == 0 {
            self.purchased_weight_kg = None;
        }
        if self.sold() == 0 {
            self.sold_weight_kg = None;
        }
        if self.category_type.is_some() && !self.is_dairy() {
            self.dairy = DairyFigures::default();
        }
        if self.category_type.is_some() && !self.is_calf() {
            self.weaning_age_months = None;
        }
    }

    /// True when both rows hold the same user-entered data.
    pub fn same_content(&self, other: &CategoryRow) -> bool {
        self.row_key == other.row_key
            && self.position == other.position
            && self.category_type == other.category_type
            && self.on_farm_count == other.on_farm_count
            && self.average_weight_kg == other.average_weight_kg
            && self.purchased_count == other.purchased_count
            && self.purchased_weight_kg == other.purchased_weight_kg
            && self.sold_count == other.sold_count
            && self.sold_weight_kg == other.sold_weight_kg
            && self.months_of_stay == other.months_of_stay
            && self.weaning_age_months == other.weaning_age_months
            && self.dairy == other.dairy
    }
}

impl Entity for CategoryRow {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn parent_id(&self) -> Uuid {
        self.batch_id
    }

    fn set_parent_id(&mut self, parent: Uuid) {
        self.batch_id = parent;
    }

    fn position(&self) -> i64 {
        i64::from(self.position)
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calf() -> CategoryType {
        CategoryType::lookup("bezerro").unwrap()
    }

    #[test]
    fn test_normalize_clears_weights_for_zero_counts() {
        let mut row = CategoryRow::blank(Uuid::new_v4())
            .with_type(calf())
            .with_purchased(0, Some(180.0))
            .with_sold(3, Some(200.0));
        row.normalize();
        assert_eq!(row.purchased_weight_kg, None);
        assert_eq!(row.sold_weight_kg, Some(200.0));
    }

    #[test]
    fn test_normalize_clears_fields_foreign_to_type() {
        let mut row = CategoryRow::blank(Uuid::new_v4())
            .with_type(CategoryType::lookup("boi").unwrap())
            .with_weaning_age(7.0);
        row.dairy.fat_pct = Some(3.5);
        row.normalize();
        assert_eq!(row.weaning_age_months, None);
        assert_eq!(row.dairy, DairyFigures::default());
    }

    #[test]
    fn test_identity_is_type_code() {
        let row = CategoryRow::blank(Uuid::new_v4());
        assert_eq!(row.identity(), None);
        let row = row.with_type(calf());
        assert_eq!(row.identity(), Some("bezerro"));
    }

    #[test]
    fn test_same_content_ignores_server_fields() {
        let row = CategoryRow::blank(Uuid::new_v4()).with_type(calf());
        let mut stored = row.clone();
        stored.id = Some(Uuid::new_v4());
        stored.stamp(Utc::now());
        assert!(row.same_content(&stored));

        stored.on_farm_count = Some(4);
        assert!(!row.same_content(&stored));
    }
}
