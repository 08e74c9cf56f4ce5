//! Error types for agent selection failures.

use crate::pool::PoolError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while selecting an agent for a lead.
#[derive(Debug, Error)]
pub enum RotationError {
    /// Pool is empty or every member is ineligible. Surfaced to the caller;
    /// the engine does not retry on its own.
    #[error("no eligible agent for source '{source_id}'")]
    NoEligibleAgent { source_id: String },

    /// No pool has been registered for the source.
    #[error("no agent pool for source '{source_id}'")]
    PoolNotFound { source_id: String },

    /// Random strategies need at least one eligible agent besides the
    /// current owner.
    #[error("no eligible agent other than '{exclude}' for source '{source_id}'")]
    NoAlternativeAgent { source_id: String, exclude: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PoolError> for RotationError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::PoolNotFound(source_id) => RotationError::PoolNotFound { source_id },
            PoolError::NoEligibleAgent(source_id) => RotationError::NoEligibleAgent { source_id },
            // Membership errors never escape selection paths.
            PoolError::DuplicateMember { source_id, .. }
            | PoolError::MemberNotFound { source_id, .. } => {
                RotationError::PoolNotFound { source_id }
            }
        }
    }
}
