//! Synchronization of dependent rows.
//!
//! Category rows drive two dependent collections per batch: the nutrition
//! lists (aligned by index) and the waste groups (one per category type).
//! After any structural change the engine:
//!
//! 1. Snapshots the current row set
//! 2. Applies the change through the gateway and re-reads the categories
//! 3. Maps dependent rows from the snapshot by category identity
//! 4. Swaps the rebuilt set into the store in one step

mod engine;
mod error;
pub mod reconcile;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use reconcile::{merge_fresh, reconcile, reconcile_nutrition, reconcile_waste};
