//! Gateway error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a persistence backend.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
