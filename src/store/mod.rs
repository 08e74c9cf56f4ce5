//! Entity store seam.
//!
//! The production system keeps leads, agents, assignments and history in a
//! relational database. The engine only depends on the `EntityStore` trait;
//! `MemoryStore` is the in-process implementation used by the binary and the
//! test suite. All ownership mutations go through `apply_assignment`, which
//! applies the whole write set (close old edge, open new edge, repoint the
//! lead, append history) as one atomic unit per lead.

mod entities;
mod error;


pub use entities::*;
pub use error::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Write set for one assignment event.
///
/// The loop-guard flag rides in the same transaction as the assignment write
/// so a crash can never leave a rotated lead without its guard.
#[derive(Debug, Clone)]
pub struct AssignmentTxn {
    pub lead_id: String,
    /// New primary owner.
    pub to_agent: String,
    /// Additional non-primary agents (multi-agent assignment).
    pub extra_agents: Vec<String>,
    pub actor: String,
    pub reason: AssignmentReason,
    /// Agent whose open edge this transaction closes, if any.
    pub close_from: Option<String>,
    pub close_reason: Option<CloseReason>,
    /// Open primary assignment id observed by the caller. A mismatch at
    /// write time means a concurrent assignment won; the caller retries.
    pub expected_open: Option<String>,
    /// Set on edges created by no-activity rotation.
    pub loop_guard: bool,
    /// No-answer recycling bumps the lead's counter in the same write.
    pub bump_no_answer: bool,
    pub at: DateTime<Utc>,
}

/// Result of a successfully applied assignment transaction.
#[derive(Debug, Clone)]
pub struct AppliedAssignment {
    /// Id of the new primary assignment edge.
    pub assignment_id: String,
    /// Agent whose edge was closed, if one was open.
    pub closed_from: Option<String>,
}

/// Aggregate lead counts for the stats surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadCounts {
    pub total: usize,
    pub fresh: usize,
    pub unassigned: usize,
}

/// CRUD plus atomic multi-write over the engine's entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError>;
    async fn insert_lead(&self, lead: Lead) -> Result<(), StoreError>;
    /// Status updates arrive from the surrounding CRM (agents working the
    /// lead); they also count as activity on the open edge.
    async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, StoreError>;
    async fn upsert_agent(&self, agent: Agent) -> Result<(), StoreError>;
    /// All agents currently eligible to receive leads.
    async fn eligible_agents(&self) -> Result<Vec<Agent>, StoreError>;
    /// All registered agents, id ascending.
    async fn all_agents(&self) -> Result<Vec<Agent>, StoreError>;
    /// Aggregate lead counts for the stats surface.
    async fn lead_counts(&self) -> Result<LeadCounts, StoreError>;

    /// Open edge matching the lead's current owner pointer.
    async fn open_primary_assignment(
        &self,
        lead_id: &str,
    ) -> Result<Option<LeadAssignment>, StoreError>;
    /// Open edge between a specific lead and agent.
    async fn open_assignment(
        &self,
        lead_id: &str,
        agent_id: &str,
    ) -> Result<Option<LeadAssignment>, StoreError>;

    /// Apply one assignment event atomically.
    async fn apply_assignment(&self, txn: AssignmentTxn) -> Result<AppliedAssignment, StoreError>;

    /// Transition the open (lead, agent) edge out of Pending. Rejection also
    /// closes the edge, freeing the lead for re-rotation.
    async fn resolve_acceptance(
        &self,
        lead_id: &str,
        agent_id: &str,
        accepted: bool,
        at: DateTime<Utc>,
    ) -> Result<LeadAssignment, StoreError>;

    /// Touch the open primary edge's activity timestamp and clear its
    /// loop guard.
    async fn record_activity(&self, lead_id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// One-way fresh flag demotion. Returns false if the lead was already
    /// demoted.
    async fn demote_fresh(&self, lead_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Open primary assignments with no activity since `older_than`
    /// (falling back to `assigned_at` when no activity was ever recorded),
    /// guard clear, lead status non-terminal. Oldest assignment first.
    async fn stale_open_assignments(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(Lead, LeadAssignment)>, StoreError>;

    /// Leads in `status`, optionally created on or after `created_after` and
    /// below an assignment-count ceiling. Oldest lead first.
    async fn leads_by_status(
        &self,
        status: LeadStatus,
        created_after: Option<DateTime<Utc>>,
        max_assignments: Option<u32>,
        limit: usize,
    ) -> Result<Vec<Lead>, StoreError>;

    /// Fresh leads that have reached the demotion threshold. Oldest first.
    async fn fresh_leads(
        &self,
        min_assignments: u32,
        limit: usize,
    ) -> Result<Vec<Lead>, StoreError>;

    async fn history(&self, lead_id: &str) -> Result<Vec<AssignmentHistoryEntry>, StoreError>;

    /// Open primary assignments still Pending since before `older_than`.
    /// Oldest first. Read-only; feeds the call-reminder sweep.
    async fn pending_unaccepted(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(Lead, LeadAssignment)>, StoreError>;

    /// Open-assignment counts per agent, for the daily digest.
    async fn open_counts_by_agent(&self) -> Result<Vec<(String, usize)>, StoreError>;
}

/// In-memory `EntityStore` over lock-free concurrent maps.
///
/// Per-lead atomicity: `apply_assignment` holds the lead's map entry for the
/// duration of the write set, so two assignments of the same lead serialize
/// while different leads proceed concurrently.
pub struct MemoryStore {
    leads: DashMap<String, Lead>,
    agents: DashMap<String, Agent>,
    /// Assignment edges keyed by lead id.
    assignments: DashMap<String, Vec<LeadAssignment>>,
    /// Append-only history keyed by lead id.
    history: DashMap<String, Vec<AssignmentHistoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            leads: DashMap::new(),
            agents: DashMap::new(),
            assignments: DashMap::new(),
            history: DashMap::new(),
        }
    }

    pub fn lead_count(&self) -> usize {
        self.leads.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn open_edge_for(&self, lead_id: &str, agent_id: &str) -> Option<LeadAssignment> {
        self.assignments.get(lead_id).and_then(|edges| {
            edges
                .iter()
                .find(|a| a.agent_id == agent_id && a.is_open())
                .cloned()
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        Ok(self.leads.get(id).map(|l| l.clone()))
    }

    async fn insert_lead(&self, lead: Lead) -> Result<(), StoreError> {
        self.leads.insert(lead.id.clone(), lead);
        Ok(())
    }

    async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut lead = self
            .leads
            .get_mut(id)
            .ok_or_else(|| StoreError::LeadNotFound(id.to_string()))?;
        lead.status = status;
        lead.updated_at = at;
        let owner = lead.agent_id.clone();
        drop(lead);

        // A status change is the owning agent working the lead, so it
        // counts as activity on the open edge.
        if let Some(owner) = owner {
            if let Some(mut edges) = self.assignments.get_mut(id) {
                if let Some(edge) = edges
                    .iter_mut()
                    .find(|a| a.agent_id == owner && a.is_open())
                {
                    edge.last_activity_at = Some(at);
                    edge.loop_guard = false;
                }
            }
        }
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, StoreError> {
        Ok(self.agents.get(id).map(|a| a.clone()))
    }

    async fn upsert_agent(&self, agent: Agent) -> Result<(), StoreError> {
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    async fn eligible_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let mut agents: Vec<Agent> = self
            .agents
            .iter()
            .filter(|entry| entry.value().is_eligible())
            .map(|entry| entry.value().clone())
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(agents)
    }

    async fn all_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|e| e.value().clone()).collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(agents)
    }

    async fn lead_counts(&self) -> Result<LeadCounts, StoreError> {
        let mut counts = LeadCounts::default();
        for entry in self.leads.iter() {
            let lead = entry.value();
            counts.total += 1;
            if lead.is_fresh {
                counts.fresh += 1;
            }
            if lead.agent_id.is_none() {
                counts.unassigned += 1;
            }
        }
        Ok(counts)
    }

    async fn open_primary_assignment(
        &self,
        lead_id: &str,
    ) -> Result<Option<LeadAssignment>, StoreError> {
        let owner = match self.leads.get(lead_id) {
            Some(lead) => match &lead.agent_id {
                Some(agent) => agent.clone(),
                None => return Ok(None),
            },
            None => return Err(StoreError::LeadNotFound(lead_id.to_string())),
        };
        Ok(self.open_edge_for(lead_id, &owner))
    }

    async fn open_assignment(
        &self,
        lead_id: &str,
        agent_id: &str,
    ) -> Result<Option<LeadAssignment>, StoreError> {
        Ok(self.open_edge_for(lead_id, agent_id))
    }

    async fn apply_assignment(&self, txn: AssignmentTxn) -> Result<AppliedAssignment, StoreError> {
        // Entry guard held for the whole write set: per-lead serialization.
        let mut lead = self
            .leads
            .get_mut(&txn.lead_id)
            .ok_or_else(|| StoreError::LeadNotFound(txn.lead_id.clone()))?;

        let current_open = lead.agent_id.as_ref().and_then(|owner| {
            self.assignments.get(&txn.lead_id).and_then(|edges| {
                edges
                    .iter()
                    .find(|a| &a.agent_id == owner && a.is_open())
                    .map(|a| a.id.clone())
            })
        });
        if current_open != txn.expected_open {
            return Err(StoreError::ConcurrentModification(txn.lead_id.clone()));
        }

        let mut edges = self.assignments.entry(txn.lead_id.clone()).or_default();

        let mut closed_from = None;
        if let Some(from) = &txn.close_from {
            if let Some(edge) = edges.iter_mut().find(|a| &a.agent_id == from && a.is_open()) {
                edge.closed_at = Some(txn.at);
                edge.close_reason = Some(txn.close_reason.unwrap_or(CloseReason::Reassigned));
                closed_from = Some(from.clone());
            }
        }

        let primary = LeadAssignment {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: txn.lead_id.clone(),
            agent_id: txn.to_agent.clone(),
            assigned_at: txn.at,
            acceptance: AcceptanceState::Pending,
            last_activity_at: None,
            loop_guard: txn.loop_guard,
            closed_at: None,
            close_reason: None,
        };
        let assignment_id = primary.id.clone();

        let mut history = self.history.entry(txn.lead_id.clone()).or_default();
        let from_agent = closed_from.clone().or_else(|| lead.agent_id.clone());

        edges.push(primary);
        history.push(AssignmentHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: txn.lead_id.clone(),
            from_agent: from_agent.clone(),
            to_agent: txn.to_agent.clone(),
            actor: txn.actor.clone(),
            reason: txn.reason,
            recorded_at: txn.at,
        });
        lead.assignment_count += 1;

        for extra in &txn.extra_agents {
            edges.push(LeadAssignment {
                id: uuid::Uuid::new_v4().to_string(),
                lead_id: txn.lead_id.clone(),
                agent_id: extra.clone(),
                assigned_at: txn.at,
                acceptance: AcceptanceState::Pending,
                last_activity_at: None,
                loop_guard: false,
                closed_at: None,
                close_reason: None,
            });
            history.push(AssignmentHistoryEntry {
                id: uuid::Uuid::new_v4().to_string(),
                lead_id: txn.lead_id.clone(),
                from_agent: from_agent.clone(),
                to_agent: extra.clone(),
                actor: txn.actor.clone(),
                reason: txn.reason,
                recorded_at: txn.at,
            });
            lead.assignment_count += 1;
        }

        lead.agent_id = Some(txn.to_agent.clone());
        if txn.bump_no_answer {
            lead.no_answer_count += 1;
        }
        lead.updated_at = txn.at;

        Ok(AppliedAssignment {
            assignment_id,
            closed_from,
        })
    }

    async fn resolve_acceptance(
        &self,
        lead_id: &str,
        agent_id: &str,
        accepted: bool,
        at: DateTime<Utc>,
    ) -> Result<LeadAssignment, StoreError> {
        // Lead guard first so acceptance cannot race an assignment write.
        let mut lead = self
            .leads
            .get_mut(lead_id)
            .ok_or_else(|| StoreError::LeadNotFound(lead_id.to_string()))?;
        lead.updated_at = at;

        let mut edges =
            self.assignments
                .get_mut(lead_id)
                .ok_or_else(|| StoreError::AssignmentNotFound {
                    lead_id: lead_id.to_string(),
                    agent_id: agent_id.to_string(),
                })?;
        let edge = edges
            .iter_mut()
            .find(|a| a.agent_id == agent_id && a.is_open())
            .ok_or_else(|| StoreError::AssignmentNotFound {
                lead_id: lead_id.to_string(),
                agent_id: agent_id.to_string(),
            })?;

        if edge.acceptance != AcceptanceState::Pending {
            return Err(StoreError::NotPending {
                assignment_id: edge.id.clone(),
                state: format!("{:?}", edge.acceptance).to_lowercase(),
            });
        }

        if accepted {
            edge.acceptance = AcceptanceState::Accepted;
        } else {
            edge.acceptance = AcceptanceState::Rejected;
            edge.closed_at = Some(at);
            edge.close_reason = Some(CloseReason::Rejected);
            // Rejection frees the lead; the reclamation flow decides what
            // happens next.
            if lead.agent_id.as_deref() == Some(agent_id) {
                lead.agent_id = None;
            }
        }
        Ok(edge.clone())
    }

    async fn record_activity(&self, lead_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let lead = self
            .leads
            .get(lead_id)
            .ok_or_else(|| StoreError::LeadNotFound(lead_id.to_string()))?;
        let owner = match &lead.agent_id {
            Some(agent) => agent.clone(),
            None => return Ok(()),
        };
        drop(lead);

        if let Some(mut edges) = self.assignments.get_mut(lead_id) {
            if let Some(edge) = edges
                .iter_mut()
                .find(|a| a.agent_id == owner && a.is_open())
            {
                edge.last_activity_at = Some(at);
                edge.loop_guard = false;
            }
        }
        Ok(())
    }

    async fn demote_fresh(&self, lead_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut lead = self
            .leads
            .get_mut(lead_id)
            .ok_or_else(|| StoreError::LeadNotFound(lead_id.to_string()))?;
        if !lead.is_fresh {
            return Ok(false);
        }
        lead.is_fresh = false;
        lead.updated_at = at;
        Ok(true)
    }

    async fn stale_open_assignments(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(Lead, LeadAssignment)>, StoreError> {
        let mut candidates: Vec<(Lead, LeadAssignment)> = Vec::new();
        for entry in self.leads.iter() {
            let lead = entry.value();
            if lead.status.is_terminal() {
                continue;
            }
            let owner = match &lead.agent_id {
                Some(agent) => agent.clone(),
                None => continue,
            };
            if let Some(edge) = self.open_edge_for(&lead.id, &owner) {
                if edge.loop_guard {
                    continue;
                }
                let last = edge.last_activity_at.unwrap_or(edge.assigned_at);
                if last < older_than {
                    candidates.push((lead.clone(), edge));
                }
            }
        }
        // FIFO: oldest assignment first, so stalled leads drain fairly.
        candidates.sort_by_key(|(_, edge)| edge.assigned_at);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn leads_by_status(
        &self,
        status: LeadStatus,
        created_after: Option<DateTime<Utc>>,
        max_assignments: Option<u32>,
        limit: usize,
    ) -> Result<Vec<Lead>, StoreError> {
        let mut leads: Vec<Lead> = self
            .leads
            .iter()
            .filter(|entry| {
                let lead = entry.value();
                lead.status == status
                    && created_after.map_or(true, |after| lead.created_at >= after)
                    && max_assignments.map_or(true, |cap| lead.assignment_count < cap)
            })
            .map(|entry| entry.value().clone())
            .collect();
        leads.sort_by_key(|l| l.created_at);
        leads.truncate(limit);
        Ok(leads)
    }

    async fn fresh_leads(
        &self,
        min_assignments: u32,
        limit: usize,
    ) -> Result<Vec<Lead>, StoreError> {
        let mut leads: Vec<Lead> = self
            .leads
            .iter()
            .filter(|entry| {
                let lead = entry.value();
                lead.is_fresh && lead.assignment_count >= min_assignments
            })
            .map(|entry| entry.value().clone())
            .collect();
        leads.sort_by_key(|l| l.created_at);
        leads.truncate(limit);
        Ok(leads)
    }

    async fn history(&self, lead_id: &str) -> Result<Vec<AssignmentHistoryEntry>, StoreError> {
        Ok(self
            .history
            .get(lead_id)
            .map(|h| h.clone())
            .unwrap_or_default())
    }

    async fn pending_unaccepted(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(Lead, LeadAssignment)>, StoreError> {
        let mut candidates: Vec<(Lead, LeadAssignment)> = Vec::new();
        for entry in self.leads.iter() {
            let lead = entry.value();
            let owner = match &lead.agent_id {
                Some(agent) => agent.clone(),
                None => continue,
            };
            if let Some(edge) = self.open_edge_for(&lead.id, &owner) {
                if edge.acceptance == AcceptanceState::Pending && edge.assigned_at < older_than {
                    candidates.push((lead.clone(), edge));
                }
            }
        }
        candidates.sort_by_key(|(_, edge)| edge.assigned_at);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn open_counts_by_agent(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
        for entry in self.assignments.iter() {
            for edge in entry.value().iter().filter(|a| a.is_open()) {
                *counts.entry(edge.agent_id.clone()).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}
