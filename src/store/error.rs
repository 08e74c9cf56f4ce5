use thiserror::Error;

/// Errors that can occur during entity store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("no open assignment for lead {lead_id} and agent {agent_id}")]
    AssignmentNotFound { lead_id: String, agent_id: String },

    /// The open-assignment state changed between read and write.
    /// Callers retry once before surfacing.
    #[error("assignment state for lead {0} changed concurrently")]
    ConcurrentModification(String),

    /// Transition attempted on an edge that already left Pending.
    #[error("assignment {assignment_id} is {state}, not pending")]
    NotPending {
        assignment_id: String,
        state: String,
    },

    /// I/O failure against the backing store. Jobs pick these leads up
    /// again on their next tick rather than retrying inline.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
