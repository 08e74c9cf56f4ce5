//! Agent Pool Registry.
//!
//! Per-source rings of agents with a single rotating "next-assign" flag.
//! Thread-safe over lock-free concurrent maps (DashMap); every mutation of a
//! ring happens under that source's map entry lock, which gives the
//! single-writer-per-source discipline rotation needs while leaving
//! different sources fully independent.

mod error;


pub use error::*;

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;

/// One agent's slot in one source's round-robin ring.
#[derive(Debug, Clone, Serialize)]
pub struct PoolMember {
    pub agent_id: String,
    /// Exactly one member per non-empty pool holds this flag.
    pub next_in_rotation: bool,
}

/// A source's ring. Members stay sorted by agent id; that ordering IS the
/// ring order and never changes with eligibility.
#[derive(Debug, Default)]
struct SourcePool {
    members: Vec<PoolMember>,
}

impl SourcePool {
    fn flagged_index(&self) -> Option<usize> {
        self.members.iter().position(|m| m.next_in_rotation)
    }

    fn index_of(&self, agent_id: &str) -> Option<usize> {
        self.members.iter().position(|m| m.agent_id == agent_id)
    }

    /// Clear every flag and set it on the ring successor of `from`.
    /// Successor of the last member wraps to the first.
    fn advance_from(&mut self, from: &str) {
        if self.members.is_empty() {
            return;
        }
        for member in &mut self.members {
            member.next_in_rotation = false;
        }
        let next = match self.index_of(from) {
            Some(i) => (i + 1) % self.members.len(),
            // Departed agent: fall back to the head of the ring.
            None => 0,
        };
        self.members[next].next_in_rotation = true;
    }
}

/// Registry of per-source agent pools and their rotation flags.
pub struct PoolRegistry {
    pools: DashMap<String, SourcePool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
        }
    }

    /// Add an agent to a source's pool. The first member of an empty pool is
    /// flagged immediately.
    pub fn add_member(&self, source_id: &str, agent_id: &str) -> Result<(), PoolError> {
        let mut pool = self.pools.entry(source_id.to_string()).or_default();
        if pool.index_of(agent_id).is_some() {
            return Err(PoolError::DuplicateMember {
                source_id: source_id.to_string(),
                agent_id: agent_id.to_string(),
            });
        }
        let flag = pool.members.is_empty();
        pool.members.push(PoolMember {
            agent_id: agent_id.to_string(),
            next_in_rotation: flag,
        });
        pool.members.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        Ok(())
    }

    /// Remove an agent from a source's pool. If the removed member held the
    /// flag it is handed to the smallest remaining agent id, preserving the
    /// exactly-one-flag invariant; an emptied pool is dropped.
    pub fn remove_member(&self, source_id: &str, agent_id: &str) -> Result<(), PoolError> {
        let mut pool = self
            .pools
            .get_mut(source_id)
            .ok_or_else(|| PoolError::PoolNotFound(source_id.to_string()))?;
        let idx = pool
            .index_of(agent_id)
            .ok_or_else(|| PoolError::MemberNotFound {
                source_id: source_id.to_string(),
                agent_id: agent_id.to_string(),
            })?;
        let held_flag = pool.members[idx].next_in_rotation;
        pool.members.remove(idx);

        if pool.members.is_empty() {
            drop(pool);
            self.pools.remove(source_id);
            return Ok(());
        }
        if held_flag {
            // Members are sorted, so index 0 is the smallest agent id.
            pool.members[0].next_in_rotation = true;
        }
        Ok(())
    }

    /// Snapshot of a source's members in ring order.
    pub fn members(&self, source_id: &str) -> Vec<PoolMember> {
        self.pools
            .get(source_id)
            .map(|p| p.members.clone())
            .unwrap_or_default()
    }

    /// Agent currently holding the rotation flag for a source.
    pub fn flagged(&self, source_id: &str) -> Option<String> {
        self.pools.get(source_id).and_then(|p| {
            p.flagged_index()
                .map(|i| p.members[i].agent_id.clone())
        })
    }

    pub fn member_count(&self, source_id: &str) -> usize {
        self.pools.get(source_id).map(|p| p.members.len()).unwrap_or(0)
    }

    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Pick the next agent for a source without advancing the flag.
    ///
    /// Returns the flagged member if eligible; otherwise the first eligible
    /// member in ring order, so the ring self-heals when the flagged agent
    /// goes offline. Eligibility filters selection only, never ring order.
    pub fn next_agent(
        &self,
        source_id: &str,
        eligible: &HashSet<String>,
    ) -> Result<String, PoolError> {
        let pool = self
            .pools
            .get(source_id)
            .ok_or_else(|| PoolError::PoolNotFound(source_id.to_string()))?;
        Self::pick(&pool, source_id, eligible)
    }

    /// Advance the rotation flag past `from_agent_id`.
    pub fn advance(&self, source_id: &str, from_agent_id: &str) -> Result<(), PoolError> {
        let mut pool = self
            .pools
            .get_mut(source_id)
            .ok_or_else(|| PoolError::PoolNotFound(source_id.to_string()))?;
        pool.advance_from(from_agent_id);
        Ok(())
    }

    /// Selection and advancement as one atomic unit relative to other
    /// rotations on the same source. This is what round-robin assignment
    /// uses; two concurrent assignments can never both observe the same
    /// "next" agent.
    pub fn select_and_advance(
        &self,
        source_id: &str,
        eligible: &HashSet<String>,
    ) -> Result<String, PoolError> {
        let mut pool = self
            .pools
            .get_mut(source_id)
            .ok_or_else(|| PoolError::PoolNotFound(source_id.to_string()))?;
        let chosen = Self::pick(&pool, source_id, eligible)?;
        pool.advance_from(&chosen);
        Ok(chosen)
    }

    /// Hand the rotation flag back to a specific member. Undoes an
    /// advancement whose assignment never committed, so the agent keeps
    /// their turn.
    pub fn restore_flag(&self, source_id: &str, agent_id: &str) -> Result<(), PoolError> {
        let mut pool = self
            .pools
            .get_mut(source_id)
            .ok_or_else(|| PoolError::PoolNotFound(source_id.to_string()))?;
        let idx = pool
            .index_of(agent_id)
            .ok_or_else(|| PoolError::MemberNotFound {
                source_id: source_id.to_string(),
                agent_id: agent_id.to_string(),
            })?;
        for member in &mut pool.members {
            member.next_in_rotation = false;
        }
        pool.members[idx].next_in_rotation = true;
        Ok(())
    }

    fn pick(
        pool: &SourcePool,
        source_id: &str,
        eligible: &HashSet<String>,
    ) -> Result<String, PoolError> {
        if let Some(i) = pool.flagged_index() {
            if eligible.contains(&pool.members[i].agent_id) {
                return Ok(pool.members[i].agent_id.clone());
            }
        }
        pool.members
            .iter()
            .find(|m| eligible.contains(&m.agent_id))
            .map(|m| m.agent_id.clone())
            .ok_or_else(|| PoolError::NoEligibleAgent(source_id.to_string()))
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
