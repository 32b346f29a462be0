//! Wizard error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::{CarAllocationError, Phase, BATCH_NAME_MAX, BATCH_NAME_MIN};
use crate::store::StoreError;
use crate::sync::SyncError;
use crate::validation::{GateFailure, PercentageOverflow};

/// Errors returned by wizard operations.
///
/// None of these are fatal: the wizard stays where it was and the caller
/// may retry.
#[derive(Error, Debug)]
pub enum WizardError {
    /// A forward transition was refused by validation.
    #[error(transparent)]
    Gate(#[from] GateFailure),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    PercentageOverflow(#[from] PercentageOverflow),

    #[error(transparent)]
    CarAllocation(#[from] CarAllocationError),

    #[error("Batch not found: {0}")]
    UnknownBatch(String),

    #[error("Category '{0}' is already used by another row of this batch")]
    DuplicateCategory(String),

    #[error("No waste management group for category '{0}'")]
    UnknownWasteCategory(String),

    #[error(
        "Batch name must have between {} and {} characters",
        BATCH_NAME_MIN,
        BATCH_NAME_MAX
    )]
    InvalidBatchName,

    #[error("Phase {0} is locked until the previous phases are complete")]
    PhaseLocked(Phase),

    #[error("Herd tabs are only available in the herd phase (current phase: {0})")]
    NotInHerdPhase(Phase),
}
