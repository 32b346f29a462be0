use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::gateway::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionSystem {
    Pasture,
    SemiConfined,
    Confined,
}

impl ProductionSystem {
    /// Grazing hours and days are only mandatory in this system.
    pub fn requires_grazing(self) -> bool {
        self == ProductionSystem::SemiConfined
    }
}

impl fmt::Display for ProductionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionSystem::Pasture => write!(f, "pasture"),
            ProductionSystem::SemiConfined => write!(f, "semi-confined"),
            ProductionSystem::Confined => write!(f, "confined"),
        }
    }
}

impl FromStr for ProductionSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pasture" => Ok(ProductionSystem::Pasture),
            "semi-confined" => Ok(ProductionSystem::SemiConfined),
            "confined" => Ok(ProductionSystem::Confined),
            _ => Err(format!(
                "Invalid production system '{}'. Valid options: pasture, semi-confined, confined",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrigin {
    Produced,
    Purchased,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrazingEntry {
    pub hours_per_day: Option<f64>,
    pub days_per_year: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientEntry {
    pub name: String,
    pub quantity_kg: Option<f64>,
    pub offer_days: Option<u32>,
    pub origin: Option<FeedOrigin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrateEntry {
    pub protein_pct: Option<f64>,
    pub urea_pct: Option<f64>,
    pub byproduct: Option<String>,
    pub quantity_kg: Option<f64>,
    pub offer_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveEntry {
    pub additive_type: Option<String>,
    pub dose: Option<f64>,
    pub extra_pct: Option<f64>,
    pub offer_days: Option<u32>,
}

/// Feed data for one batch. The four lists are aligned by index with the
/// batch's category rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub id: Option<Uuid>,
    pub batch_id: Uuid,
    pub includes_feed_data: bool,
    pub production_system: Option<ProductionSystem>,
    #[serde(default)]
    pub grazing: Vec<GrazingEntry>,
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub concentrates: Vec<ConcentrateEntry>,
    #[serde(default)]
    pub additives: Vec<AdditiveEntry>,
    /// Row key of the category each entry belongs to, as written to
    /// storage. Empty in memory, where entries align by index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_keys: Vec<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NutritionRecord {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            ..Default::default()
        }
    }

    /// Record with `len` default entries in each list.
    pub fn sized(batch_id: Uuid, len: usize) -> Self {
        let mut record = Self::new(batch_id);
        record.resize(len);
        record
    }

    pub fn resize(&mut self, len: usize) {
        self.grazing.resize_with(len, Default::default);
        self.ingredients.resize_with(len, Default::default);
        self.concentrates.resize_with(len, Default::default);
        self.additives.resize_with(len, Default::default);
    }

    pub fn remove_at(&mut self, index: usize) {
        if index < self.grazing.len() {
            self.grazing.remove(index);
        }
        if index < self.ingredients.len() {
            self.ingredients.remove(index);
        }
        if index < self.concentrates.len() {
            self.concentrates.remove(index);
        }
        if index < self.additives.len() {
            self.additives.remove(index);
        }
    }

    /// Shortest list length; equals every list length when aligned.
    pub fn len(&self) -> usize {
        [
            self.grazing.len(),
            self.ingredients.len(),
            self.concentrates.len(),
            self.additives.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_aligned_with(&self, rows: usize) -> bool {
        self.grazing.len() == rows
            && self.ingredients.len() == rows
            && self.concentrates.len() == rows
            && self.additives.len() == rows
    }

    /// Copy as written to storage: without feed data the lists are dropped.
    pub fn for_storage(&self) -> NutritionRecord {
        let mut record = self.clone();
        if !record.includes_feed_data {
            record.production_system = None;
            record.grazing.clear();
            record.ingredients.clear();
            record.concentrates.clear();
            record.additives.clear();
        }
        record.entry_keys.clear();
        record
    }

    pub fn same_content(&self, other: &NutritionRecord) -> bool {
        self.includes_feed_data == other.includes_feed_data
            && self.production_system == other.production_system
            && self.grazing == other.grazing
            && self.ingredients == other.ingredients
            && self.concentrates == other.concentrates
            && self.additives == other.additives
            && self.entry_keys == other.entry_keys
    }
}

impl Entity for NutritionRecord {
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

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}
