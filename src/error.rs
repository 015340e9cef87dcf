use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced to callers of the lifecycle operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A required field is missing or an enum value is invalid; checked
    /// before any store call, so the operation is a no-op
    #[error("validation failed: {0}")]
    Validation(String),

    /// The entity's current status forbids the requested action
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A referenced id does not resolve in the store
    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: String },

    /// Check-in was requested for a product with no open rental
    #[error("no active rental found for product {product_id}")]
    NoActiveRental { product_id: String },

    /// Transport/permission/query failure from the store; not retried
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { collection, id } => TrackerError::NotFound { collection, id },
            StoreError::GuardConflict { collection, id, .. } => TrackerError::InvalidState(
                format!("{collection} document {id} changed state underneath this operation"),
            ),
            other => TrackerError::Store(other),
        }
    }
}
