use super::{GateFailure, Issue, StockViolation};
use crate::models::{Batch, CategoryRow, HerdTab};
use crate::store::RowStore;

/// Mandatory fields a category row is still missing, in form order.
///
/// Purchased and sold weights are only needed when the matching head count
/// is non-zero; weaning age only for calf types.
pub fn missing_category_fields(row: &CategoryRow) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if row.category_type.is_none() {
        missing.push("category type");
    }
    if row.on_farm_count.is_none() {
        missing.push("head count on farm");
    }
    if row.average_weight_kg.is_none() {
        missing.push("average weight");
    }
    if row.purchased() > 0 && row.purchased_weight_kg.is_none() {
        missing.push("purchased weight");
    }
    if row.sold() > 0 && row.sold_weight_kg.is_none() {
        missing.push("sold weight");
    }
    if row.months_of_stay.is_none() {
        missing.push("months of stay");
    }
    if row.is_calf() && row.weaning_age_months.is_none() {
        missing.push("weaning age");
    }
    missing
}

/// A category row is complete when its mandatory fields are filled in.
pub fn is_category_row_complete(row: &CategoryRow) -> bool {
    missing_category_fields(row).is_empty()
}

/// Rows, across all batches, selling more animals than were available.
pub fn stock_violations(batches: &[Batch], store: &RowStore) -> Vec<StockViolation> {
    let mut violations = Vec::new();
    for batch in batches {
        let Some(rows) = store.get_rows(batch.handle) else {
            continue;
        };
        for row in rows {
            let available = u64::from(row.on_farm()) + u64::from(row.purchased());
            if u64::from(row.sold()) > available {
                violations.push(StockViolation {
                    batch: batch.name.clone(),
                    category: row.label(),
                    sold: row.sold(),
                    on_farm: row.on_farm(),
                    purchased: row.purchased(),
                });
            }
        }
    }
    violations
}

/// Gate for leaving the information tab.
///
/// Stock arithmetic is checked first, since it lists every offending row.
pub fn check_information(batches: &[Batch], store: &RowStore) -> Result<(), GateFailure> {
    let violations = stock_violations(batches, store);
    if !violations.is_empty() {
        return Err(GateFailure::Reconciliation { violations });
    }

    let named: Vec<&Batch> = batches.iter().filter(|b| b.has_valid_name()).collect();
    if named.is_empty() {
        return Err(GateFailure::Incomplete {
            tab: HerdTab::Information,
            issues: vec![Issue::NoNamedBatch],
        });
    }

    let has_complete = named.iter().any(|batch| {
        store
            .get_rows(batch.handle)
            .is_some_and(|rows| rows.iter().any(is_category_row_complete))
    });
    if !has_complete {
        return Err(GateFailure::Incomplete {
            tab: HerdTab::Information,
            issues: vec![Issue::NoCompleteCategory],
        });
    }
    Ok(())
}

pub fn can_advance_from_information(batches: &[Batch], store: &RowStore) -> bool {
    check_information(batches, store).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryType;
    use uuid::Uuid;

    fn batch_with(store: &mut RowStore, name: &str, rows: Vec<CategoryRow>) -> Batch {
        let batch = Batch::pending(Uuid::new_v4(), name, 0);
        store.open(batch.handle);
        for (i, row) in rows.into_iter().enumerate() {
            store.upsert_one(batch.handle, i, row).unwrap();
        }
        batch
    }

    fn steers() -> CategoryRow {
        CategoryRow::blank(Uuid::nil())
            .with_type(CategoryType::lookup("boi").unwrap())
            .with_stock(10, 420.0, 12)
            .with_purchased(0, None)
            .with_sold(0, None)
    }

    #[test]
    fn test_row_completeness_rules() {
        assert!(is_category_row_complete(&steers()));
        assert!(!is_category_row_complete(&CategoryRow::blank(Uuid::nil())));

        let bought = steers().with_purchased(4, None);
        assert!(!is_category_row_complete(&bought));
        assert!(is_category_row_complete(&steers().with_purchased(4, Some(300.0))));

        let sold = steers().with_sold(2, None);
        assert!(!is_category_row_complete(&sold));

        let calves = CategoryRow::blank(Uuid::nil())
            .with_type(CategoryType::lookup("bezerro").unwrap())
            .with_stock(8, 90.0, 6);
        assert!(!is_category_row_complete(&calves));
        assert!(is_category_row_complete(&calves.with_weaning_age(7.0)));
    }

    #[test]
    fn test_missing_fields_follow_form_order() {
        assert!(missing_category_fields(&steers()).is_empty());

        let mut partial = steers().with_purchased(4, None);
        partial.on_farm_count = None;
        assert_eq!(
            missing_category_fields(&partial),
            vec!["head count on farm", "purchased weight"]
        );

        let calves = CategoryRow::blank(Uuid::nil())
            .with_type(CategoryType::lookup("bezerro").unwrap())
            .with_stock(8, 90.0, 6);
        assert_eq!(missing_category_fields(&calves), vec!["weaning age"]);
    }

    #[test]
    fn test_single_complete_category_passes() {
        let mut store = RowStore::new();
        let batch = batch_with(&mut store, "Lote 1", vec![steers()]);
        assert!(can_advance_from_information(&[batch], &store));
    }

    #[test]
    fn test_sold_above_stock_lists_arithmetic() {
        let mut store = RowStore::new();
        let batch = batch_with(&mut store, "Lote 1", vec![steers().with_sold(15, None)]);

        let err = check_information(&[batch], &store).unwrap_err();
        match &err {
            GateFailure::Reconciliation { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].sold, 15);
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(err.to_string().contains("15 > 10 + 0 = 10"));
    }

    #[test]
    fn test_every_offending_row_is_reported() {
        let mut store = RowStore::new();
        let a = batch_with(&mut store, "Lote A", vec![steers().with_sold(11, Some(1.0))]);
        let b = batch_with(
            &mut store,
            "Lote B",
            vec![steers(), steers().with_sold(30, Some(1.0))],
        );
        let violations = stock_violations(&[a, b], &store);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].batch, "Lote B");
    }

    #[test]
    fn test_short_name_blocks() {
        let mut store = RowStore::new();
        let batch = batch_with(&mut store, "L1", vec![steers()]);
        let err = check_information(&[batch], &store).unwrap_err();
        assert_eq!(err.first_issue(), Some(&Issue::NoNamedBatch));
    }

    #[test]
    fn test_named_batch_needs_complete_row() {
        let mut store = RowStore::new();
        let named = batch_with(&mut store, "Lote 1", vec![CategoryRow::blank(Uuid::nil())]);
        let unnamed = batch_with(&mut store, "x", vec![steers()]);
        let err = check_information(&[named, unnamed], &store).unwrap_err();
        assert_eq!(err.first_issue(), Some(&Issue::NoCompleteCategory));
    }
}
