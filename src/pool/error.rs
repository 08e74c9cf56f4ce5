/// Errors that can occur during pool registry operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("no pool registered for source: {0}")]
    PoolNotFound(String),

    #[error("agent {agent_id} is already in the pool for source {source_id}")]
    DuplicateMember {
        source_id: String,
        agent_id: String,
    },

    #[error("agent {agent_id} is not in the pool for source {source_id}")]
    MemberNotFound {
        source_id: String,
        agent_id: String,
    },

    #[error("no eligible agent in the pool for source: {0}")]
    NoEligibleAgent(String),
}
