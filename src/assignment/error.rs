//! Error types for assignment operations.

use crate::rotation::RotationError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the assignment orchestrator.
///
/// Interactive callers always get a structured error kind with a
/// human-readable message; the engine never silently no-ops.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Pool empty or every member ineligible. Not retried by the engine.
    #[error("no eligible agent available for source '{source_id}'")]
    NoEligibleAgent { source_id: String },

    /// Target agent is flagged ineligible. Bad input, not retried.
    #[error("agent '{0}' is excluded from receiving leads")]
    AgentExcluded(String),

    /// Target agent id does not resolve. Bad input, not retried.
    #[error("unknown agent: '{0}'")]
    UnknownAgent(String),

    #[error("unknown lead: '{0}'")]
    LeadNotFound(String),

    /// No open assignment edge matches the (lead, agent) pair.
    #[error("no open assignment of lead '{lead_id}' to agent '{agent_id}'")]
    AssignmentNotFound { lead_id: String, agent_id: String },

    /// Acceptance transition attempted on a non-pending edge.
    #[error("assignment of lead '{lead_id}' is no longer pending")]
    NotPending { lead_id: String },

    /// State changed between read and write even after one internal retry.
    #[error("lead '{0}' was modified concurrently, try again")]
    ConcurrentModification(String),

    #[error(transparent)]
    Rotation(RotationError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<RotationError> for AssignmentError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::NoEligibleAgent { source_id }
            | RotationError::PoolNotFound { source_id } => {
                AssignmentError::NoEligibleAgent { source_id }
            }
            RotationError::NoAlternativeAgent { source_id, .. } => {
                AssignmentError::NoEligibleAgent { source_id }
            }
            RotationError::Store(e) => AssignmentError::from(e),
        }
    }
}

impl From<StoreError> for AssignmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LeadNotFound(id) => AssignmentError::LeadNotFound(id),
            StoreError::AgentNotFound(id) => AssignmentError::UnknownAgent(id),
            StoreError::AssignmentNotFound { lead_id, agent_id } => {
                AssignmentError::AssignmentNotFound { lead_id, agent_id }
            }
            StoreError::ConcurrentModification(id) => AssignmentError::ConcurrentModification(id),
            other => AssignmentError::Store(other),
        }
    }
}
