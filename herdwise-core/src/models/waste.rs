use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::gateway::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementType {
    Pasture,
    DailySpread,
    SolidStorage,
    DryLot,
    LiquidSlurry,
    AnaerobicLagoon,
    AnaerobicDigester,
    Composting,
    DeepBedding,
}

impl ManagementType {
    pub const ALL: [ManagementType; 9] = [
        ManagementType::Pasture,
        ManagementType::DailySpread,
        ManagementType::SolidStorage,
        ManagementType::DryLot,
        ManagementType::LiquidSlurry,
        ManagementType::AnaerobicLagoon,
        ManagementType::AnaerobicDigester,
        ManagementType::Composting,
        ManagementType::DeepBedding,
    ];
}

impl fmt::Display for ManagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagementType::Pasture => "pasture",
            ManagementType::DailySpread => "daily-spread",
            ManagementType::SolidStorage => "solid-storage",
            ManagementType::DryLot => "dry-lot",
            ManagementType::LiquidSlurry => "liquid-slurry",
            ManagementType::AnaerobicLagoon => "anaerobic-lagoon",
            ManagementType::AnaerobicDigester => "anaerobic-digester",
            ManagementType::Composting => "composting",
            ManagementType::DeepBedding => "deep-bedding",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ManagementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        ManagementType::ALL
            .into_iter()
            .find(|t| t.to_string() == wanted)
            .ok_or_else(|| {
                let options: Vec<String> =
                    ManagementType::ALL.iter().map(|t| t.to_string()).collect();
                format!(
                    "Invalid management type '{}'. Valid options: {}",
                    s,
                    options.join(", ")
                )
            })
    }
}

/// Share of a category's animals under one manure management type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
    pub id: Option<Uuid>,
    pub batch_id: Uuid,
    pub category: String,
    pub management_type: Option<ManagementType>,
    pub percentage: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WasteRecord {
    /// An empty record: no type, zero percent.
    pub fn blank(batch_id: Uuid, category: impl Into<String>) -> Self {
        Self {
            id: None,
            batch_id,
            category: category.into(),
            management_type: None,
            percentage: 0.0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with(mut self, management_type: ManagementType, percentage: f64) -> Self {
        self.management_type = Some(management_type);
        self.percentage = percentage;
        self
    }

    pub fn same_content(&self, other: &WasteRecord) -> bool {
        self.category == other.category
            && self.management_type == other.management_type
            && self.percentage == other.percentage
    }
}

impl Entity for WasteRecord {
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

/// Waste records for one category type of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WasteGroup {
    pub category: String,
    pub label: String,
    pub records: Vec<WasteRecord>,
}

impl WasteGroup {
    pub fn new(batch_id: Uuid, category: impl Into<String>, label: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            records: vec![WasteRecord::blank(batch_id, category.clone())],
            category,
            label: label.into(),
        }
    }
}
