//! Assignment Orchestrator.
//!
//! Every change of lead ownership flows through here: manual assignment,
//! round-robin distribution, multi-agent (commission-sharing) assignment,
//! reassignment, and the accept/reject transitions. Each mutating mode
//! applies one atomic store transaction (close the old edge, open the new
//! Pending edge, repoint the lead, append history) and, for round-robin,
//! advances the source's ring. Rejection frees the lead but never triggers
//! the next assignment itself; that is the reclamation jobs' decision, which
//! keeps a single request from recursing through the pool.

pub mod error;


pub use error::AssignmentError;

use crate::activity::ActivityLog;
use crate::notify::{self, NotificationSender};
use crate::rotation::Selector;
use crate::scheduler::Clock;
use crate::store::{
    AcceptanceState, AssignmentReason, AssignmentTxn, CloseReason, EntityStore, Lead,
};
use std::sync::Arc;
use std::time::Duration;

/// Structured result of an assignment call.
#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub lead_id: String,
    pub agent_id: String,
    pub assignment_id: String,
    pub message: String,
}

/// Orchestrates ownership changes over the store, the selector, the
/// activity log and the notification sender.
pub struct Orchestrator {
    store: Arc<dyn EntityStore>,
    selector: Arc<Selector>,
    activity: Arc<dyn ActivityLog>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    notify_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        selector: Arc<Selector>,
        activity: Arc<dyn ActivityLog>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            selector,
            activity,
            notifier,
            clock,
            notify_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn selector(&self) -> &Arc<Selector> {
        &self.selector
    }

    async fn require_lead(&self, lead_id: &str) -> Result<Lead, AssignmentError> {
        self.store
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| AssignmentError::LeadNotFound(lead_id.to_string()))
    }

    async fn require_eligible_agent(&self, agent_id: &str) -> Result<(), AssignmentError> {
        let agent = self
            .store
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| AssignmentError::UnknownAgent(agent_id.to_string()))?;
        if !agent.is_eligible() {
            return Err(AssignmentError::AgentExcluded(agent_id.to_string()));
        }
        Ok(())
    }

    /// Apply the write set, retrying once if a concurrent assignment won the
    /// race; a second ConcurrentModification surfaces to the caller.
    async fn apply(
        &self,
        lead: &Lead,
        to_agent: &str,
        extra_agents: Vec<String>,
        actor: &str,
        reason: AssignmentReason,
        close_from: Option<String>,
        close_reason: Option<CloseReason>,
        loop_guard: bool,
        bump_no_answer: bool,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let mut expected_open = self
            .store
            .open_primary_assignment(&lead.id)
            .await?
            .map(|a| a.id);
        let mut close_from = close_from;

        for attempt in 0..2 {
            let txn = AssignmentTxn {
                lead_id: lead.id.clone(),
                to_agent: to_agent.to_string(),
                extra_agents: extra_agents.clone(),
                actor: actor.to_string(),
                reason,
                close_from: close_from.clone(),
                close_reason,
                expected_open: expected_open.clone(),
                loop_guard,
                bump_no_answer,
                at: self.clock.now(),
            };
            match self.store.apply_assignment(txn).await {
                Ok(applied) => {
                    self.activity.record(
                        "lead.assigned",
                        &lead.id,
                        actor,
                        serde_json::json!({
                            "to_agent": to_agent,
                            "from_agent": applied.closed_from,
                            "reason": reason.to_string(),
                            "loop_guard": loop_guard,
                        }),
                    );
                    metrics::counter!("rotor_assignments_total",
                        "reason" => reason.to_string()
                    )
                    .increment(1);
                    notify::dispatch(
                        Arc::clone(&self.notifier),
                        to_agent.to_string(),
                        format!("Lead '{}' has been assigned to you", lead.name),
                        self.notify_timeout,
                    );
                    return Ok(AssignmentOutcome {
                        lead_id: lead.id.clone(),
                        agent_id: to_agent.to_string(),
                        assignment_id: applied.assignment_id,
                        message: format!(
                            "Lead '{}' assigned to agent '{}' ({})",
                            lead.name, to_agent, reason
                        ),
                    });
                }
                Err(crate::store::StoreError::ConcurrentModification(_)) if attempt == 0 => {
                    tracing::debug!(
                        lead_id = %lead.id,
                        "assignment raced a concurrent write, retrying once"
                    );
                    let fresh = self.require_lead(&lead.id).await?;
                    let open = self.store.open_primary_assignment(&lead.id).await?;
                    expected_open = open.map(|a| a.id);
                    close_from = fresh.agent_id.clone();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AssignmentError::ConcurrentModification(lead.id.clone()))
    }

    /// Assign via the source's round-robin ring; selection and ring
    /// advancement execute as one atomic unit per source.
    pub async fn assign_round_robin(
        &self,
        lead_id: &str,
        source_id: &str,
        actor: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        let agent_id = self.selector.select_and_advance(source_id).await?;
        let outcome = self
            .apply(
                &lead,
                &agent_id,
                vec![],
                actor,
                AssignmentReason::RoundRobin,
                lead.agent_id.clone(),
                Some(CloseReason::Reassigned),
                false,
                false,
            )
            .await;
        if outcome.is_err() {
            // Nothing was written, so the agent keeps their turn.
            self.selector.restore_flag(source_id, &agent_id);
        }
        outcome
    }

    /// Assign directly to a chosen agent, bypassing rotation.
    pub async fn assign_manual(
        &self,
        lead_id: &str,
        agent_id: &str,
        actor: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        self.require_eligible_agent(agent_id).await?;
        self.apply(
            &lead,
            agent_id,
            vec![],
            actor,
            AssignmentReason::Manual,
            lead.agent_id.clone(),
            Some(CloseReason::Reassigned),
            false,
            false,
        )
        .await
    }

    /// Assign one lead to several agents at once (commission sharing).
    /// The first id becomes the primary owner. Ids are resolved before any
    /// write so a bad id fails the whole call.
    pub async fn assign_multiple(
        &self,
        lead_id: &str,
        agent_ids: &[String],
        actor: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        let (primary, rest) = agent_ids
            .split_first()
            .ok_or_else(|| AssignmentError::UnknownAgent("(empty agent list)".to_string()))?;
        for agent_id in agent_ids {
            if self.store.get_agent(agent_id).await?.is_none() {
                return Err(AssignmentError::UnknownAgent(agent_id.clone()));
            }
        }
        self.apply(
            &lead,
            primary,
            rest.to_vec(),
            actor,
            AssignmentReason::MultiAgent,
            lead.agent_id.clone(),
            Some(CloseReason::Reassigned),
            false,
            false,
        )
        .await
    }

    /// Close one agent's edge and open another's.
    pub async fn reassign(
        &self,
        lead_id: &str,
        from_agent: &str,
        to_agent: &str,
        actor: &str,
        reason: CloseReason,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        self.require_eligible_agent(to_agent).await?;
        let outcome = self
            .apply(
                &lead,
                to_agent,
                vec![],
                actor,
                AssignmentReason::Reassignment,
                Some(from_agent.to_string()),
                Some(reason),
                false,
                false,
            )
            .await?;
        self.activity.record(
            "lead.reassigned",
            lead_id,
            actor,
            serde_json::json!({ "from_agent": from_agent, "to_agent": to_agent, "reason": reason.to_string() }),
        );
        Ok(outcome)
    }

    /// Rotate a stalled lead through the ring. The new edge carries the
    /// loop guard so the no-activity job cannot pick this lead up again
    /// until fresh activity clears it.
    pub async fn rotate_no_activity(
        &self,
        lead_id: &str,
        actor: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        let agent_id = self.selector.select_and_advance(&lead.source_id).await?;
        let outcome = self
            .apply(
                &lead,
                &agent_id,
                vec![],
                actor,
                AssignmentReason::NoActivityRotation,
                lead.agent_id.clone(),
                Some(CloseReason::NoActivity),
                true,
                false,
            )
            .await;
        if outcome.is_err() {
            // Nothing was written, so the agent keeps their turn.
            self.selector.restore_flag(&lead.source_id, &agent_id);
        }
        outcome
    }

    /// Recycle a lead to a random different eligible agent. Used by the
    /// no-answer and not-interested jobs; deliberately not the ring.
    pub async fn recycle_random(
        &self,
        lead_id: &str,
        actor: &str,
        reason: AssignmentReason,
        close_reason: CloseReason,
        bump_no_answer: bool,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        let agent_id = self
            .selector
            .random_other(&lead.source_id, lead.agent_id.as_deref())
            .await?;
        self.apply(
            &lead,
            &agent_id,
            vec![],
            actor,
            reason,
            lead.agent_id.clone(),
            Some(close_reason),
            false,
            bump_no_answer,
        )
        .await
    }

    /// Route a lead to the configured fallback agent, terminating its
    /// recycling cycle.
    pub async fn escalate_fallback(
        &self,
        lead_id: &str,
        fallback_agent: &str,
        actor: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let lead = self.require_lead(lead_id).await?;
        if self.store.get_agent(fallback_agent).await?.is_none() {
            return Err(AssignmentError::UnknownAgent(fallback_agent.to_string()));
        }
        self.apply(
            &lead,
            fallback_agent,
            vec![],
            actor,
            AssignmentReason::FallbackEscalation,
            lead.agent_id.clone(),
            Some(CloseReason::NotInterestedRecycled),
            false,
            false,
        )
        .await
    }

    /// Agent accepts their pending assignment.
    pub async fn accept(
        &self,
        lead_id: &str,
        agent_id: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let edge = self
            .store
            .resolve_acceptance(lead_id, agent_id, true, self.clock.now())
            .await
            .map_err(|e| Self::map_acceptance_error(e, lead_id))?;
        debug_assert_eq!(edge.acceptance, AcceptanceState::Accepted);
        self.activity.record(
            "lead.accepted",
            lead_id,
            agent_id,
            serde_json::json!({ "assignment_id": edge.id }),
        );
        Ok(AssignmentOutcome {
            lead_id: lead_id.to_string(),
            agent_id: agent_id.to_string(),
            assignment_id: edge.id,
            message: format!("Agent '{}' accepted lead '{}'", agent_id, lead_id),
        })
    }

    /// Agent rejects their pending assignment. The edge closes and the lead
    /// is freed for re-rotation, but no new assignment happens here.
    pub async fn reject(
        &self,
        lead_id: &str,
        agent_id: &str,
        reason: &str,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let edge = self
            .store
            .resolve_acceptance(lead_id, agent_id, false, self.clock.now())
            .await
            .map_err(|e| Self::map_acceptance_error(e, lead_id))?;
        self.activity.record(
            "lead.rejected",
            lead_id,
            agent_id,
            serde_json::json!({ "assignment_id": edge.id, "reason": reason }),
        );
        metrics::counter!("rotor_rejections_total").increment(1);
        Ok(AssignmentOutcome {
            lead_id: lead_id.to_string(),
            agent_id: agent_id.to_string(),
            assignment_id: edge.id,
            message: format!(
                "Agent '{}' rejected lead '{}': {}",
                agent_id, lead_id, reason
            ),
        })
    }

    /// Record agent activity on a lead; clears the loop guard so the lead
    /// becomes rotatable again once it stalls.
    pub async fn record_activity(&self, lead_id: &str) -> Result<(), AssignmentError> {
        self.store
            .record_activity(lead_id, self.clock.now())
            .await?;
        Ok(())
    }

    fn map_acceptance_error(err: crate::store::StoreError, lead_id: &str) -> AssignmentError {
        match err {
            crate::store::StoreError::NotPending { .. } => AssignmentError::NotPending {
                lead_id: lead_id.to_string(),
            },
            other => other.into(),
        }
    }
}
