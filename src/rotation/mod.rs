//! Agent selection for lead distribution.
//!
//! The `Selector` joins the pool registry (ring order, rotation flag) with
//! agent eligibility from the entity store. Round-robin paths go through
//! `select_and_advance`, which executes as one atomic unit per source;
//! recycling jobs use `random_other` instead, which deliberately ignores the
//! ring to break correlated failure patterns.

pub mod error;
pub mod strategies;


pub use error::RotationError;
pub use strategies::RotationStrategy;

use crate::pool::PoolRegistry;
use crate::store::EntityStore;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

/// Picks agents for leads using the source's ring or random choice.
pub struct Selector {
    pool: Arc<PoolRegistry>,
    store: Arc<dyn EntityStore>,
}

impl Selector {
    pub fn new(pool: Arc<PoolRegistry>, store: Arc<dyn EntityStore>) -> Self {
        Self { pool, store }
    }

    pub fn pool(&self) -> &Arc<PoolRegistry> {
        &self.pool
    }

    /// Ids of eligible agents that are members of the source's pool,
    /// in ring order.
    async fn eligible_members(&self, source_id: &str) -> Result<Vec<String>, RotationError> {
        let eligible: HashSet<String> = self
            .store
            .eligible_agents()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        Ok(self
            .pool
            .members(source_id)
            .into_iter()
            .filter(|m| eligible.contains(&m.agent_id))
            .map(|m| m.agent_id)
            .collect())
    }

    async fn eligible_set(&self) -> Result<HashSet<String>, RotationError> {
        Ok(self
            .store
            .eligible_agents()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }

    /// Peek at the next agent for a source without moving the flag.
    pub async fn next_agent(&self, source_id: &str) -> Result<String, RotationError> {
        let eligible = self.eligible_set().await?;
        Ok(self.pool.next_agent(source_id, &eligible)?)
    }

    /// Move the rotation flag past `from_agent_id`.
    pub fn advance(&self, source_id: &str, from_agent_id: &str) -> Result<(), RotationError> {
        Ok(self.pool.advance(source_id, from_agent_id)?)
    }

    /// Pick the next agent and advance the ring in one atomic step.
    pub async fn select_and_advance(&self, source_id: &str) -> Result<String, RotationError> {
        let eligible = self.eligible_set().await?;
        Ok(self.pool.select_and_advance(source_id, &eligible)?)
    }

    /// Hand the rotation flag back to `agent_id`. Callers use this when the
    /// assignment backing a `select_and_advance` failed to commit, so the
    /// agent's turn is not consumed without a lead.
    pub fn restore_flag(&self, source_id: &str, agent_id: &str) {
        if let Err(e) = self.pool.restore_flag(source_id, agent_id) {
            // Pool membership changed underneath us; the ring already
            // re-homed the flag, nothing left to restore.
            tracing::debug!(source_id, agent_id, error = %e, "rotation flag not restored");
        }
    }

    /// Uniformly random eligible pool member different from `exclude`.
    pub async fn random_other(
        &self,
        source_id: &str,
        exclude: Option<&str>,
    ) -> Result<String, RotationError> {
        let mut candidates = self.eligible_members(source_id).await?;
        if let Some(exclude) = exclude {
            candidates.retain(|id| id != exclude);
        }
        if candidates.is_empty() {
            return match exclude {
                Some(exclude) => Err(RotationError::NoAlternativeAgent {
                    source_id: source_id.to_string(),
                    exclude: exclude.to_string(),
                }),
                None => Err(RotationError::NoEligibleAgent {
                    source_id: source_id.to_string(),
                }),
            };
        }
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        Ok(candidates.swap_remove(idx))
    }
}
