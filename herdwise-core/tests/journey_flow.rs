use std::sync::Arc;
use std::time::Duration;

use herdwise_core::models::IngredientEntry;
use herdwise_core::{
    CategoryType, GateFailure, HerdTab, InMemoryGateway, Level, ManagementType, Persistence,
    Phase, Position, RecordingNotifier, StoreError, Wizard, WizardError,
};
use uuid::Uuid;

struct Harness {
    gateway: Arc<InMemoryGateway>,
    notifier: Arc<RecordingNotifier>,
    wizard: Wizard,
}

async fn harness() -> Harness {
    let gateway = Arc::new(InMemoryGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let wizard = Wizard::open(
        Persistence::from_backend(gateway.clone()),
        notifier.clone(),
        "fazenda-boa-vista",
        "Inventário 2024",
        Duration::from_secs(2),
    )
    .await
    .unwrap();
    Harness {
        gateway,
        notifier,
        wizard,
    }
}

fn fill_row(wizard: &mut Wizard, handle: Uuid, index: usize, code: &str, on_farm: u32) {
    wizard
        .edit_category_row(handle, index, |row| {
            row.category_type = CategoryType::lookup(code);
            row.on_farm_count = Some(on_farm);
            row.average_weight_kg = Some(410.0);
            row.purchased_count = Some(0);
            row.sold_count = Some(0);
            row.months_of_stay = Some(12);
        })
        .unwrap();
}

#[tokio::test]
async fn test_scenario_a_single_category_advances() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);

    assert!(h.wizard.check_tab(HerdTab::Information).is_ok());
    assert_eq!(
        h.wizard.advance().await.unwrap(),
        Position::Tab(HerdTab::Nutrition)
    );
}

#[tokio::test]
async fn test_scenario_b_sold_above_stock_blocks() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.wizard
        .edit_category_row(handle, 0, |row| {
            row.sold_count = Some(15);
            row.sold_weight_kg = Some(450.0);
        })
        .unwrap();

    let err = h.wizard.advance().await.unwrap_err();
    let WizardError::Gate(GateFailure::Reconciliation { violations }) = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(violations.len(), 1);
    assert!(err.to_string().contains("15 > 10 + 0 = 10"));
    assert_eq!(h.notifier.count(Level::Error), 1);
    assert_eq!(h.wizard.position(), Position::Tab(HerdTab::Information));
}

#[tokio::test]
async fn test_scenario_c_management_needs_hundred_percent() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.wizard.select_tab(HerdTab::Management).await.unwrap();

    h.wizard
        .set_waste_type(handle, "boi", 0, ManagementType::Pasture)
        .unwrap();
    h.wizard.set_waste_percentage(handle, "boi", 0, 60.0).unwrap();
    let second = h.wizard.add_waste_record(handle, "boi").unwrap();
    h.wizard
        .set_waste_type(handle, "boi", second, ManagementType::DryLot)
        .unwrap();
    h.wizard
        .set_waste_percentage(handle, "boi", second, 30.0)
        .unwrap();
    assert!(h.wizard.check_tab(HerdTab::Management).is_err());

    let third = h.wizard.add_waste_record(handle, "boi").unwrap();
    h.wizard
        .set_waste_type(handle, "boi", third, ManagementType::Composting)
        .unwrap();
    h.wizard
        .set_waste_percentage(handle, "boi", third, 10.0)
        .unwrap();
    assert!(h.wizard.check_tab(HerdTab::Management).is_ok());

    assert_eq!(
        h.wizard.advance().await.unwrap(),
        Position::Phase(Phase::Grazing)
    );
    assert!(h.wizard.journey().is_phase_complete(Phase::Herd));
    assert_eq!(h.gateway.row_counts()[3], 3);
}

#[tokio::test]
async fn test_scenario_d_only_waste_record_stays() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "vaca-corte", 40);

    let err = h
        .wizard
        .remove_waste_record(handle, "vaca-corte", 0)
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::Store(StoreError::MinimumRows(_))
    ));
    let set = h.wizard.rows(handle).unwrap();
    assert_eq!(set.waste_group("vaca-corte").unwrap().records.len(), 1);
}

#[tokio::test]
async fn test_scenario_e_car_allocation_sum() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "garrote", 30);
    h.wizard
        .edit_category_row(handle, 0, |row| {
            row.purchased_count = Some(20);
            row.purchased_weight_kg = Some(220.0);
        })
        .unwrap();
    h.wizard.flush().await;

    let mut draft = h.wizard.open_car_allocation(handle, 0).await.unwrap();
    draft.set_row(0, "MT-5107909-A", 12);
    let second = draft.add_row();
    draft.set_row(second, "MT-5107909-B", 8);
    assert!(draft.can_confirm());

    draft.set_row(second, "MT-5107909-B", 5);
    assert!(!draft.can_confirm());
    assert!(h.wizard.confirm_car_allocation(&draft).await.is_err());
    assert_eq!(h.gateway.row_counts()[4], 0);
}

#[tokio::test]
async fn test_transition_flush_is_idempotent() {
    let mut h = harness().await;
    let first = h.wizard.add_batch("Lote 1");
    let second = h.wizard.add_batch("Lote 2");
    fill_row(&mut h.wizard, first, 0, "boi", 10);
    fill_row(&mut h.wizard, second, 0, "novilha", 25);

    h.wizard.flush().await;
    let after_first = h.gateway.mutations();
    assert_eq!(h.gateway.row_counts()[..2], [2, 2]);

    let report = h.wizard.flush().await;
    assert!(report.is_clean());
    assert_eq!(h.gateway.mutations(), after_first);
    assert_eq!(h.gateway.row_counts()[..2], [2, 2]);
}

#[tokio::test]
async fn test_nutrition_stays_aligned_through_mutations() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    let codes = ["boi", "novilha", "touro", "vaca-seca"];

    fill_row(&mut h.wizard, handle, 0, codes[0], 10);
    for (i, code) in codes.iter().enumerate().skip(1) {
        let index = h.wizard.add_category_row(handle).unwrap();
        assert_eq!(index, i);
        fill_row(&mut h.wizard, handle, index, code, 5);
        let set = h.wizard.rows(handle).unwrap();
        assert!(set.nutrition.is_aligned_with(set.len()));
    }
    h.wizard.flush().await;

    h.wizard.remove_category_row(handle, 1).await.unwrap();
    let set = h.wizard.rows(handle).unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.nutrition.is_aligned_with(3));

    h.wizard
        .edit_category_row(handle, 2, |row| row.on_farm_count = Some(7))
        .unwrap();
    let set = h.wizard.rows(handle).unwrap();
    assert!(set.nutrition.is_aligned_with(set.len()));
}

#[tokio::test]
async fn test_feed_data_follows_category_across_removal() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.wizard.add_category_row(handle).unwrap();
    fill_row(&mut h.wizard, handle, 1, "novilha", 12);
    h.wizard.select_tab(HerdTab::Nutrition).await.unwrap();

    let hay = IngredientEntry {
        name: "feno de tifton".to_string(),
        quantity_kg: Some(8.0),
        offer_days: Some(90),
        origin: None,
    };
    h.wizard
        .edit_nutrition(handle, |record| {
            record.includes_feed_data = true;
            record.ingredients[1] = hay.clone();
        })
        .unwrap();
    h.wizard.select_tab(HerdTab::Information).await.unwrap();

    h.wizard.remove_category_row(handle, 0).await.unwrap();
    let set = h.wizard.rows(handle).unwrap();
    assert_eq!(set.categories[0].identity(), Some("novilha"));
    assert_eq!(set.nutrition.ingredients[0], hay);
    assert!(set.waste_group("boi").is_none());
}

#[tokio::test]
async fn test_reopen_restores_saved_rows() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.wizard.add_category_row(handle).unwrap();
    fill_row(&mut h.wizard, handle, 1, "bezerro", 4);
    h.wizard.flush().await;

    let reopened = Wizard::open(
        Persistence::from_backend(h.gateway.clone()),
        h.notifier.clone(),
        "fazenda-boa-vista",
        "Inventário 2024",
        Duration::from_secs(2),
    )
    .await
    .unwrap();
    let batch = reopened.find_batch("lote 1").unwrap();
    let set = reopened.rows(batch.handle).unwrap();

    // The calf row has no weaning age, so only the steer row was saved.
    assert_eq!(set.len(), 1);
    assert_eq!(set.categories[0].identity(), Some("boi"));
    assert!(set.nutrition.is_aligned_with(1));
}

#[tokio::test]
async fn test_reopen_keeps_feed_data_when_saved_row_turns_incomplete() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.wizard.add_category_row(handle).unwrap();
    fill_row(&mut h.wizard, handle, 1, "touro", 3);
    h.wizard
        .edit_nutrition(handle, |record| {
            record.includes_feed_data = true;
            record.ingredients[0].name = "silagem".to_string();
            record.ingredients[1].name = "feno".to_string();
        })
        .unwrap();
    assert!(h.wizard.flush().await.is_clean());

    // Storage keeps the complete steer row from the first save.
    h.wizard
        .edit_category_row(handle, 0, |row| row.on_farm_count = None)
        .unwrap();
    assert!(h.wizard.flush().await.is_clean());

    let reopened = Wizard::open(
        Persistence::from_backend(h.gateway.clone()),
        h.notifier.clone(),
        "fazenda-boa-vista",
        "Inventário 2024",
        Duration::from_secs(2),
    )
    .await
    .unwrap();
    let batch = reopened.find_batch("Lote 1").unwrap();
    let set = reopened.rows(batch.handle).unwrap();

    assert_eq!(set.len(), 2);
    assert!(set.nutrition.is_aligned_with(2));
    assert_eq!(set.categories[0].identity(), Some("boi"));
    assert_eq!(set.nutrition.ingredients[0].name, "silagem");
    assert_eq!(set.categories[1].identity(), Some("touro"));
    assert_eq!(set.nutrition.ingredients[1].name, "feno");
}

#[tokio::test]
async fn test_autosave_failure_keeps_local_edits() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    h.gateway.set_fail_writes(true);

    let report = h.wizard.flush().await;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(h.notifier.count(Level::Error), 1);
    assert_eq!(h.wizard.rows(handle).unwrap().categories[0].on_farm(), 10);

    h.gateway.set_fail_writes(false);
    let report = h.wizard.flush().await;
    assert!(report.is_clean());
    assert_eq!(h.gateway.row_counts()[..2], [1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_autosave_waits_for_quiet_period() {
    let mut h = harness().await;
    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);

    assert!(h.wizard.autosave_if_due().await.is_none());
    tokio::time::advance(Duration::from_millis(2100)).await;
    let report = h.wizard.autosave_if_due().await.unwrap();
    assert_eq!(report.created, 1);
    assert!(h.wizard.autosave_if_due().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_autosave_sleeps_out_quiet_period() {
    let mut h = harness().await;
    assert!(h.wizard.run_debounced_autosave().await.is_none());

    let handle = h.wizard.add_batch("Lote 1");
    fill_row(&mut h.wizard, handle, 0, "boi", 10);
    let start = tokio::time::Instant::now();

    let report = h.wizard.run_debounced_autosave().await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(report.created, 1);
    assert_eq!(h.gateway.row_counts()[..2], [1, 1]);
    assert!(h.wizard.run_debounced_autosave().await.is_none());
}
