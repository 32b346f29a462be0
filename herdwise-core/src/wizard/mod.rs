//! Wizard controller.
//!
//! Owns the journey, its batches and their rows, and sequences the phases
//! and herd tabs. Every transition first awaits the autosave flush of the
//! tab being left; forward moves are then gated by validation, backward
//! moves never are.

mod edit;
mod error;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::autosave::{AutosaveController, SaveReport, SaveScope};
use crate::gateway::Persistence;
use crate::models::{Batch, HerdTab, Journey, JourneyStatus, Phase};
use crate::notify::Notifier;
use crate::store::{RowSet, RowStore};
use crate::sync::SyncEngine;
use crate::validation::{check_information, check_management, check_nutrition, GateFailure};

pub use error::WizardError;

/// Where the wizard stands after a navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Tab(HerdTab),
    Phase(Phase),
    Completed,
}

pub struct Wizard {
    journey: Journey,
    batches: Vec<Batch>,
    store: RowStore,
    persistence: Persistence,
    notifier: Arc<dyn Notifier>,
    engine: SyncEngine,
    autosave: AutosaveController,
}

impl Wizard {
    /// Loads the owner's journey, creating it on first visit, with every
    /// batch and its rows.
    pub async fn open(
        persistence: Persistence,
        notifier: Arc<dyn Notifier>,
        owner: &str,
        name: &str,
        quiet_period: Duration,
    ) -> Result<Self, WizardError> {
        let journey = match persistence.journeys.find_by_owner(owner).await? {
            Some(journey) => journey,
            None => {
                let journey = persistence.journeys.save(&Journey::new(owner, name)).await?;
                info!(owner, journey = %journey.id, "created journey");
                journey
            }
        };

        let batches: Vec<Batch> = persistence
            .batches
            .list_by_parent(journey.id)
            .await?
            .into_iter()
            .map(Batch::loaded)
            .collect();

        let engine = SyncEngine::new(persistence.clone());
        let mut store = RowStore::new();
        for batch in &batches {
            engine.load(&mut store, batch).await?;
        }
        info!(
            journey = %journey.id,
            phase = %journey.current_phase,
            batches = batches.len(),
            "opened journey"
        );

        let autosave = AutosaveController::new(persistence.clone(), engine.clone(), quiet_period);
        Ok(Self {
            journey,
            batches,
            store,
            persistence,
            notifier,
            engine,
            autosave,
        })
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn rows(&self, handle: Uuid) -> Option<&RowSet> {
        self.store.get(handle)
    }

    pub fn batch(&self, handle: Uuid) -> Option<&Batch> {
        self.batches.iter().find(|b| b.handle == handle)
    }

    /// Looks a batch up by name, ignoring case and surrounding spaces.
    pub fn find_batch(&self, name: &str) -> Option<&Batch> {
        let name = name.trim();
        self.batches
            .iter()
            .find(|b| b.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn position(&self) -> Position {
        match self.journey.current_phase {
            _ if self.journey.status == JourneyStatus::Completed => Position::Completed,
            Phase::Herd => Position::Tab(self.journey.herd_tab),
            phase => Position::Phase(phase),
        }
    }

    /// Runs the gate for leaving `tab`.
    pub fn check_tab(&self, tab: HerdTab) -> Result<(), GateFailure> {
        match tab {
            HerdTab::Information => check_information(&self.batches, &self.store),
            HerdTab::Nutrition => check_nutrition(&self.batches, &self.store),
            HerdTab::Management => check_management(&self.batches, &self.store),
        }
    }

    /// Switches herd tab.
    ///
    /// Forward moves require every tab before `target` to pass its gate.
    pub async fn select_tab(&mut self, target: HerdTab) -> Result<(), WizardError> {
        let phase = self.journey.current_phase;
        if phase != Phase::Herd {
            return Err(WizardError::NotInHerdPhase(phase));
        }
        let current = self.journey.herd_tab;
        if target == current {
            return Ok(());
        }

        self.flush_scope(SaveScope::for_tab(current)).await;
        if target > current {
            for tab in HerdTab::ALL.into_iter().filter(|t| *t < target) {
                self.gate(tab)?;
            }
        }

        self.enter(target).await?;
        self.journey.herd_tab = target;
        self.save_journey().await?;
        info!(from = %current, to = %target, "switched tab");
        Ok(())
    }

    /// Moves one step forward: the next tab, or past the current phase.
    pub async fn advance(&mut self) -> Result<Position, WizardError> {
        let phase = self.journey.current_phase;
        if phase == Phase::Herd {
            let tab = self.journey.herd_tab;
            if let Some(next) = tab.next() {
                self.select_tab(next).await?;
                return Ok(self.position());
            }
            self.flush_scope(SaveScope::All).await;
            for tab in HerdTab::ALL {
                self.gate(tab)?;
            }
        }

        self.journey.complete_phase(phase);
        self.save_journey().await?;
        info!(%phase, status = %self.journey.status, "completed phase");
        self.notifier
            .success(&format!("Phase {} complete", phase));

        if self.journey.current_phase == Phase::Herd {
            self.enter(self.journey.herd_tab).await?;
        }
        Ok(self.position())
    }

    /// Moves one step back. Never gated.
    pub async fn retreat(&mut self) -> Result<Position, WizardError> {
        let phase = self.journey.current_phase;
        if phase == Phase::Herd {
            match self.journey.herd_tab.previous() {
                Some(previous) => self.select_tab(previous).await?,
                None => self.notifier.info("Already at the first step"),
            }
            return Ok(self.position());
        }

        if let Some(previous) = phase.previous() {
            self.journey.current_phase = previous;
            self.save_journey().await?;
            if previous == Phase::Herd {
                self.enter(self.journey.herd_tab).await?;
            }
            info!(from = %phase, to = %previous, "moved back a phase");
        }
        Ok(self.position())
    }

    /// Jumps to a phase. Later phases stay locked until the earlier ones
    /// are complete.
    pub async fn select_phase(&mut self, target: Phase) -> Result<(), WizardError> {
        if !self.journey.is_phase_unlocked(target) {
            let err = WizardError::PhaseLocked(target);
            warn!(phase = %target, "refused locked phase");
            self.notifier.warning(&err.to_string());
            return Err(err);
        }
        let current = self.journey.current_phase;
        if current == target {
            return Ok(());
        }
        if current == Phase::Herd {
            self.flush_scope(SaveScope::for_tab(self.journey.herd_tab))
                .await;
        }

        self.journey.current_phase = target;
        self.save_journey().await?;
        if target == Phase::Herd {
            self.enter(self.journey.herd_tab).await?;
        }
        info!(from = %current, to = %target, "switched phase");
        Ok(())
    }

    /// Records an edit for the background autosave.
    pub fn note_edit(&mut self) {
        self.autosave.note_edit();
    }

    /// Saves the current tab if the quiet period has passed since the last
    /// edit.
    pub async fn autosave_if_due(&mut self) -> Option<SaveReport> {
        if !self.autosave.is_due() {
            return None;
        }
        Some(self.flush_scope(self.current_scope()).await)
    }

    /// Waits out the quiet period, then saves the current tab.
    pub async fn run_debounced_autosave(&mut self) -> Option<SaveReport> {
        if !self.autosave.debouncer().is_pending() {
            return None;
        }
        self.autosave.wait_due().await;
        Some(self.flush_scope(self.current_scope()).await)
    }

    /// Saves everything, regardless of the active tab.
    pub async fn flush(&mut self) -> SaveReport {
        self.flush_scope(SaveScope::All).await
    }

    fn current_scope(&self) -> SaveScope {
        match self.journey.current_phase {
            Phase::Herd => SaveScope::for_tab(self.journey.herd_tab),
            _ => SaveScope::All,
        }
    }

    async fn flush_scope(&mut self, scope: SaveScope) -> SaveReport {
        self.autosave
            .flush(
                self.journey.id,
                scope,
                &mut self.batches,
                &mut self.store,
                self.notifier.as_ref(),
            )
            .await
    }

    fn gate(&self, tab: HerdTab) -> Result<(), WizardError> {
        let Err(failure) = self.check_tab(tab) else {
            return Ok(());
        };
        warn!(tab = %tab, reason = %failure, "transition refused");
        match failure {
            GateFailure::Reconciliation { .. } => self.notifier.error(&failure.to_string()),
            GateFailure::Incomplete { .. } => self.notifier.warning(&failure.to_string()),
        }
        Err(failure.into())
    }

    /// Entry actions for a tab.
    async fn enter(&mut self, tab: HerdTab) -> Result<(), WizardError> {
        match tab {
            HerdTab::Information => {
                for batch in &self.batches {
                    self.engine.refresh_categories(&mut self.store, batch).await?;
                }
            }
            HerdTab::Nutrition | HerdTab::Management => {
                if self.batches.iter().any(Batch::is_pending) {
                    self.flush_scope(SaveScope::Information).await;
                }
                for batch in &self.batches {
                    if !self.store.contains(batch.handle) {
                        self.engine.load(&mut self.store, batch).await?;
                    }
                }
                self.engine.reconcile_local(&mut self.store, &self.batches);
            }
        }
        Ok(())
    }

    async fn save_journey(&mut self) -> Result<(), WizardError> {
        self.journey.updated_at = Utc::now();
        self.journey = self.persistence.journeys.save(&self.journey).await?;
        Ok(())
    }

    fn batch_index(&self, handle: Uuid) -> Result<usize, WizardError> {
        self.batches
            .iter()
            .position(|b| b.handle == handle)
            .ok_or_else(|| WizardError::UnknownBatch(handle.to_string()))
    }
}
