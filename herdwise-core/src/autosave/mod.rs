//! Autosave controller.
//!
//! Two triggers share one upsert routine:
//!
//! 1. A debounced background save: edits call [`AutosaveController::note_edit`]
//!    and the draft is written once the quiet period passes with no new edit.
//! 2. A transition flush: the wizard awaits [`AutosaveController::flush`]
//!    before every tab or phase change.
//!
//! Within a batch the writes are strictly ordered (batch, categories,
//! nutrition, waste). Different batches are saved concurrently. A failed
//! batch is logged and reported, and its local rows are left as they are.

mod debounce;
mod save;

use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, Persistence};
use crate::models::Batch;
use crate::notify::Notifier;
use crate::store::RowStore;
use crate::sync::SyncEngine;

pub use debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use save::SaveScope;

use save::{save_batch, SavedBatch};

/// Outcome of one flush.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Batches whose save sequence completed.
    pub saved: usize,
    /// Pending batches promoted to stored ones.
    pub created: usize,
    /// Pending batches left alone because their name is invalid.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, GatewayError)>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct AutosaveController {
    persistence: Persistence,
    engine: SyncEngine,
    debouncer: Debouncer,
}

impl AutosaveController {
    pub fn new(persistence: Persistence, engine: SyncEngine, quiet: Duration) -> Self {
        Self {
            persistence,
            engine,
            debouncer: Debouncer::new(quiet),
        }
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Records an edit for the background save.
    pub fn note_edit(&mut self) {
        self.debouncer.signal();
    }

    pub fn is_due(&self) -> bool {
        self.debouncer.is_due()
    }

    /// Sleeps until the background save is due.
    pub async fn wait_due(&self) {
        self.debouncer.wait_due().await;
    }

    /// Writes every batch and folds what storage returns back into the store.
    ///
    /// Clears the debounce deadline, so a transition flush also covers any
    /// background save that was about to fire.
    pub async fn flush(
        &mut self,
        journey_id: Uuid,
        scope: SaveScope,
        batches: &mut [Batch],
        store: &mut RowStore,
        notifier: &dyn Notifier,
    ) -> SaveReport {
        self.debouncer.cancel();

        let snapshots: Vec<(Batch, Option<_>)> = batches
            .iter()
            .map(|b| (b.clone(), store.get(b.handle).cloned()))
            .collect();
        let names: Vec<String> = snapshots.iter().map(|(b, _)| b.name.clone()).collect();

        let persistence = &self.persistence;
        let results = join_all(
            snapshots
                .into_iter()
                .map(|(batch, set)| save_batch(persistence, journey_id, scope, batch, set)),
        )
        .await;

        let mut report = SaveReport::default();
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(Some(saved)) => {
                    report.saved += 1;
                    if saved.created {
                        report.created += 1;
                    }
                    self.apply(batches, store, saved);
                }
                Ok(None) => report.skipped.push(name),
                Err(err) => {
                    warn!(batch = %name, error = %err, "autosave failed");
                    notifier.error(&format!("Could not save batch {}: {}", name, err));
                    report.failed.push((name, err));
                }
            }
        }

        info!(
            ?scope,
            saved = report.saved,
            created = report.created,
            failed = report.failed.len(),
            "autosave flushed"
        );
        report
    }

    fn apply(&self, batches: &mut [Batch], store: &mut RowStore, saved: SavedBatch) {
        let handle = saved.batch.handle;
        if let Some(slot) = batches.iter_mut().find(|b| b.handle == handle) {
            *slot = saved.batch;
        }
        if !store.contains(handle) {
            return;
        }

        let previous = self.engine.snapshot(store, handle);
        self.engine.apply(store, handle, &previous, saved.categories);

        if let Some(stored) = saved.nutrition {
            if let Some(set) = store.get(handle) {
                let mut record = set.nutrition.clone();
                record.id = stored.id;
                // Only fails for unknown handles, checked above.
                let _ = store.upsert_nutrition(handle, record);
            }
        }
        if let Some(groups) = saved.waste {
            for group in groups {
                let known = store
                    .get(handle)
                    .is_some_and(|set| set.waste_group(&group.category).is_some());
                if known {
                    let _ = store.upsert_waste_group(handle, group);
                }
            }
        }
    }
}
