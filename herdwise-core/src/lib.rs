//! Herdwise Core Library
//!
//! Herd inventory journey: phase and tab sequencing, identity-preserving
//! row synchronization, gated progression and debounced autosave.
//! Storage and user notifications are supplied by the caller.

pub mod autosave;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod store;
pub mod sync;
pub mod validation;
pub mod wizard;

pub use autosave::{AutosaveController, Debouncer, SaveReport, SaveScope, DEFAULT_QUIET_PERIOD};
pub use gateway::memory::InMemoryGateway;
pub use gateway::{
    Entity, GatewayError, GatewayResult, JourneyRepository, Persistence, Repository,
};
pub use models::{
    Batch, CarAllocation, CarAllocationDraft, CarAllocationError, CategoryKind, CategoryRow,
    CategoryType, HerdTab, Journey, JourneyStatus, ManagementType, NutritionRecord, Phase,
    ProductionSystem, WasteGroup, WasteRecord,
};
pub use notify::{Level, Notifier, NullNotifier, RecordingNotifier};
pub use store::{MinimumRowsViolation, RowSet, RowStore, StoreError};
pub use sync::{SyncEngine, SyncError};
pub use validation::{GateFailure, Issue, PercentageOverflow, StockViolation};
pub use wizard::{Position, Wizard, WizardError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
