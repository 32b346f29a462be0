//! Sync error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Errors that can occur while reconciling rows with storage.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Refused locally, before any storage call.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
