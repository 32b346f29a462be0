use std::fmt;

use super::{format_percentage, to_hundredths, GateFailure, Issue};
use crate::models::{Batch, HerdTab, WasteGroup};
use crate::store::RowStore;

/// A percentage edit that would push a batch past 100%, or a value that is
/// not a percentage at all.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentageOverflow {
    pub batch: String,
    pub requested: f64,
    pub total: f64,
}

impl fmt::Display for PercentageOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.requested.is_finite() || self.requested < 0.0 {
            return write!(f, "{}: {} is not a valid percentage", self.batch, self.requested);
        }
        write!(
            f,
            "{}: {}% would bring the total to {}%, above 100%",
            self.batch,
            format_percentage(self.requested),
            format_percentage(self.total)
        )
    }
}

impl std::error::Error for PercentageOverflow {}

fn batch_total_hundredths(groups: &[WasteGroup]) -> i64 {
    groups
        .iter()
        .flat_map(|g| g.records.iter())
        .map(|r| to_hundredths(r.percentage))
        .sum()
}

/// Checks a percentage edit against the batch's running total.
///
/// `index` addresses a record inside the group for `category`; an index one
/// past the end is a new record.
pub fn check_percentage_edit(
    batch: &Batch,
    groups: &[WasteGroup],
    category: &str,
    index: usize,
    value: f64,
) -> Result<(), PercentageOverflow> {
    let current = groups
        .iter()
        .find(|g| g.category == category)
        .and_then(|g| g.records.get(index))
        .map(|r| to_hundredths(r.percentage))
        .unwrap_or(0);
    let total = batch_total_hundredths(groups) - current + to_hundredths(value);
    if !value.is_finite() || value < 0.0 || total > 10_000 {
        return Err(PercentageOverflow {
            batch: batch.name.clone(),
            requested: value,
            total: total as f64 / 100.0,
        });
    }
    Ok(())
}

/// Gate for leaving the management tab.
///
/// Every record needs a type, and each batch's percentages must add up to
/// exactly 100 with at least one non-zero share.
pub fn check_management(batches: &[Batch], store: &RowStore) -> Result<(), GateFailure> {
    let mut issues = Vec::new();

    for batch in batches {
        let Some(set) = store.get(batch.handle) else {
            continue;
        };
        if set.waste.is_empty() {
            continue;
        }
        for group in &set.waste {
            if group.records.iter().any(|r| r.management_type.is_none()) {
                issues.push(Issue::MissingManagementType {
                    batch: batch.name.clone(),
                    category: group.label.clone(),
                });
            }
        }
        let total = batch_total_hundredths(&set.waste);
        let any_share = set
            .waste
            .iter()
            .flat_map(|g| g.records.iter())
            .any(|r| to_hundredths(r.percentage) > 0);
        if total != 10_000 || !any_share {
            issues.push(Issue::PercentageTotal {
                batch: batch.name.clone(),
                total: total as f64 / 100.0,
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(GateFailure::Incomplete {
            tab: HerdTab::Management,
            issues,
        })
    }
}

pub fn can_advance_from_management(batches: &[Batch], store: &RowStore) -> bool {
    check_management(batches, store).is_ok()
}
