use super::information::is_category_row_complete;
use super::{GateFailure, Issue};
use crate::models::{
    AdditiveEntry, Batch, ConcentrateEntry, GrazingEntry, HerdTab, IngredientEntry,
};
use crate::store::RowStore;

fn grazing_ok(entry: &GrazingEntry) -> bool {
    entry.hours_per_day.is_some() && entry.days_per_year.is_some()
}

fn ingredient_ok(entry: &IngredientEntry) -> bool {
    !entry.name.trim().is_empty()
        && entry.quantity_kg.is_some()
        && entry.offer_days.is_some()
        && entry.origin.is_some()
}

fn concentrate_ok(entry: &ConcentrateEntry) -> bool {
    let described = entry.protein_pct.is_some()
        || entry.urea_pct.is_some()
        || entry
            .byproduct
            .as_deref()
            .is_some_and(|b| !b.trim().is_empty());
    described && entry.quantity_kg.is_some() && entry.offer_days.is_some()
}

fn additive_ok(entry: &AdditiveEntry) -> bool {
    let described = entry
        .additive_type
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty())
        || entry.dose.is_some()
        || entry.extra_pct.is_some();
    described && entry.offer_days.is_some()
}

/// Gate for leaving the nutrition tab.
///
/// Batches without feed data pass trivially. Otherwise every complete
/// category row needs its aligned feed entries.
pub fn check_nutrition(batches: &[Batch], store: &RowStore) -> Result<(), GateFailure> {
    let mut issues = Vec::new();

    for batch in batches {
        let Some(set) = store.get(batch.handle) else {
            continue;
        };
        let record = &set.nutrition;
        if !record.includes_feed_data {
            continue;
        }
        let Some(system) = record.production_system else {
            issues.push(Issue::MissingProductionSystem {
                batch: batch.name.clone(),
            });
            continue;
        };

        for (i, row) in set.categories.iter().enumerate() {
            if !is_category_row_complete(row) {
                continue;
            }
            let name = || batch.name.clone();
            let category = row.label();

            if system.requires_grazing() && !record.grazing.get(i).is_some_and(grazing_ok) {
                issues.push(Issue::MissingGrazing {
                    batch: name(),
                    category: category.clone(),
                });
            }
            if !record.ingredients.get(i).is_some_and(ingredient_ok) {
                issues.push(Issue::MissingIngredient {
                    batch: name(),
                    category: category.clone(),
                });
            }
            if !record.concentrates.get(i).is_some_and(concentrate_ok) {
                issues.push(Issue::MissingConcentrate {
                    batch: name(),
                    category: category.clone(),
                });
            }
            if !record.additives.get(i).is_some_and(additive_ok) {
                issues.push(Issue::MissingAdditive {
                    batch: name(),
                    category,
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(GateFailure::Incomplete {
            tab: HerdTab::Nutrition,
            issues,
        })
    }
}

pub fn can_advance_from_nutrition(batches: &[Batch], store: &RowStore) -> bool {
    check_nutrition(batches, store).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRow, CategoryType, FeedOrigin, NutritionRecord, ProductionSystem};
    use uuid::Uuid;

    fn setup(system: Option<ProductionSystem>) -> (Vec<Batch>, RowStore, NutritionRecord) {
        let mut store = RowStore::new();
        let batch = Batch::pending(Uuid::new_v4(), "Lote 1", 0);
        store.open(batch.handle);
        let row = CategoryRow::blank(Uuid::nil())
            .with_type(CategoryType::lookup("boi").unwrap())
            .with_stock(10, 400.0, 12);
        store.upsert_one(batch.handle, 0, row).unwrap();

        let mut record = NutritionRecord::sized(batch.handle, 1);
        record.includes_feed_data = true;
        record.production_system = system;
        (vec![batch], store, record)
    }

    fn filled(mut record: NutritionRecord) -> NutritionRecord {
        record.ingredients[0] = IngredientEntry {
            name: "silagem de milho".to_string(),
            quantity_kg: Some(12.0),
            offer_days: Some(120),
            origin: Some(FeedOrigin::Produced),
        };
        record.concentrates[0] = ConcentrateEntry {
            protein_pct: Some(18.0),
            quantity_kg: Some(2.0),
            offer_days: Some(120),
            ..Default::default()
        };
        record.additives[0] = AdditiveEntry {
            additive_type: Some("monensina".to_string()),
            offer_days: Some(120),
            ..Default::default()
        };
        record
    }

    #[test]
    fn test_without_feed_data_passes() {
        let (batches, mut store, mut record) = setup(None);
        record.includes_feed_data = false;
        store.upsert_nutrition(batches[0].handle, record).unwrap();
        assert!(can_advance_from_nutrition(&batches, &store));
    }

    #[test]
    fn test_production_system_required() {
        let (batches, mut store, record) = setup(None);
        store.upsert_nutrition(batches[0].handle, filled(record)).unwrap();
        let err = check_nutrition(&batches, &store).unwrap_err();
        assert!(matches!(
            err.first_issue(),
            Some(Issue::MissingProductionSystem { .. })
        ));
    }

    #[test]
    fn test_filled_entries_pass_outside_semi_confined() {
        let (batches, mut store, record) = setup(Some(ProductionSystem::Confined));
        store.upsert_nutrition(batches[0].handle, filled(record)).unwrap();
        assert!(can_advance_from_nutrition(&batches, &store));
    }

    #[test]
    fn test_semi_confined_requires_grazing() {
        let (batches, mut store, record) = setup(Some(ProductionSystem::SemiConfined));
        let mut record = filled(record);
        store
            .upsert_nutrition(batches[0].handle, record.clone())
            .unwrap();
        let err = check_nutrition(&batches, &store).unwrap_err();
        assert!(matches!(err.first_issue(), Some(Issue::MissingGrazing { .. })));

        record.grazing[0] = GrazingEntry {
            hours_per_day: Some(6.0),
            days_per_year: Some(180),
        };
        store.upsert_nutrition(batches[0].handle, record).unwrap();
        assert!(can_advance_from_nutrition(&batches, &store));
    }

    #[test]
    fn test_ingredient_needs_origin() {
        let (batches, mut store, record) = setup(Some(ProductionSystem::Pasture));
        let mut record = filled(record);
        record.ingredients[0].origin = None;
        store.upsert_nutrition(batches[0].handle, record).unwrap();
        let err = check_nutrition(&batches, &store).unwrap_err();
        assert!(matches!(
            err.first_issue(),
            Some(Issue::MissingIngredient { .. })
        ));
    }

    #[test]
    fn test_concentrate_accepts_byproduct() {
        let (batches, mut store, record) = setup(Some(ProductionSystem::Confined));
        let mut record = filled(record);
        record.concentrates[0].protein_pct = None;
        record.concentrates[0].byproduct = Some("caroço de algodão".to_string());
        store.upsert_nutrition(batches[0].handle, record).unwrap();
        assert!(can_advance_from_nutrition(&batches, &store));
    }
}
