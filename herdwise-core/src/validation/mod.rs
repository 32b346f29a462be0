//! Validation engine.
//!
//! Pure predicates over batches and their rows. Each tab has a `check_*`
//! function returning the itemized reasons it can't be left, and a
//! `can_advance_from_*` shorthand. Nothing here touches storage.

mod information;
mod management;
mod nutrition;

use std::fmt;

use crate::models::{AllocationRow, HerdTab};

pub use information::{
    can_advance_from_information, check_information, is_category_row_complete,
    missing_category_fields, stock_violations,
};
pub use management::{
    can_advance_from_management, check_management, check_percentage_edit, PercentageOverflow,
};
pub use nutrition::{can_advance_from_nutrition, check_nutrition};

/// Sold animals exceeding what the batch had available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockViolation {
    pub batch: String,
    pub category: String,
    pub sold: u32,
    pub on_farm: u32,
    pub purchased: u32,
}

impl fmt::Display for StockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}: sold {} > {} + {} = {}",
            self.batch,
            self.category,
            self.sold,
            self.on_farm,
            self.purchased,
            u64::from(self.on_farm) + u64::from(self.purchased)
        )
    }
}

/// One unmet rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    NoNamedBatch,
    NoCompleteCategory,
    MissingProductionSystem { batch: String },
    MissingGrazing { batch: String, category: String },
    MissingIngredient { batch: String, category: String },
    MissingConcentrate { batch: String, category: String },
    MissingAdditive { batch: String, category: String },
    MissingManagementType { batch: String, category: String },
    PercentageTotal { batch: String, total: f64 },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::NoNamedBatch => write!(
                f,
                "Add a batch whose name has at least 3 characters"
            ),
            Issue::NoCompleteCategory => write!(
                f,
                "Fill in at least one complete category (type, head count, average weight, months of stay)"
            ),
            Issue::MissingProductionSystem { batch } => {
                write!(f, "{}: choose a production system", batch)
            }
            Issue::MissingGrazing { batch, category } => {
                write!(f, "{} / {}: grazing hours and days are required", batch, category)
            }
            Issue::MissingIngredient { batch, category } => write!(
                f,
                "{} / {}: ingredient needs a name, quantity, offer days and origin",
                batch, category
            ),
            Issue::MissingConcentrate { batch, category } => write!(
                f,
                "{} / {}: concentrate needs protein, urea or by-product, with quantity and offer days",
                batch, category
            ),
            Issue::MissingAdditive { batch, category } => write!(
                f,
                "{} / {}: additive needs a type, dose or extra percentage, with offer days",
                batch, category
            ),
            Issue::MissingManagementType { batch, category } => {
                write!(f, "{} / {}: choose a management type", batch, category)
            }
            Issue::PercentageTotal { batch, total } => write!(
                f,
                "{}: management percentages add up to {}%, expected 100%",
                batch,
                format_percentage(*total)
            ),
        }
    }
}

/// Why a tab can't be left.
#[derive(Debug, Clone, PartialEq)]
pub enum GateFailure {
    /// Required data is missing; the first issue is the one shown.
    Incomplete { tab: HerdTab, issues: Vec<Issue> },
    /// Stock arithmetic doesn't hold; every offending row is listed.
    Reconciliation { violations: Vec<StockViolation> },
}

impl GateFailure {
    pub fn tab(&self) -> HerdTab {
        match self {
            GateFailure::Incomplete { tab, .. } => *tab,
            GateFailure::Reconciliation { .. } => HerdTab::Information,
        }
    }

    pub fn first_issue(&self) -> Option<&Issue> {
        match self {
            GateFailure::Incomplete { issues, .. } => issues.first(),
            GateFailure::Reconciliation { .. } => None,
        }
    }
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateFailure::Incomplete { tab, issues } => match issues.first() {
                Some(first) => write!(f, "{}: {}", tab.label(), first),
                None => write!(f, "{}: incomplete", tab.label()),
            },
            GateFailure::Reconciliation { violations } => {
                write!(f, "Sold animals exceed available stock:")?;
                for violation in violations {
                    write!(f, "\n  - {}", violation)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for GateFailure {}

/// Percentages compared in hundredths.
pub(crate) fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub(crate) fn format_percentage(value: f64) -> String {
    let hundredths = to_hundredths(value);
    if hundredths % 100 == 0 {
        format!("{}", hundredths / 100)
    } else {
        format!("{:.2}", value)
    }
}

/// Allocated head counts equal `purchased` and every used row names a code.
pub fn allocation_matches(purchased: u32, rows: &[AllocationRow]) -> bool {
    if rows.is_empty() {
        return false;
    }
    let allocated: u64 = rows.iter().map(|r| u64::from(r.head_count)).sum();
    let named = rows
        .iter()
        .all(|r| r.head_count == 0 || !r.car_code.trim().is_empty());
    allocated == u64::from(purchased) && named
}
