//! Not-interested recycling with fallback escalation.
//!
//! A Not Interested lead gets two more chances with random different
//! agents; the rotation that brings its assignment count to the ceiling
//! routes it to the configured fallback/admin agent instead, which ends the
//! recycling cycle for that lead.

use super::{gate, record_skip, record_summary, JobContext, JobError, JobSummary, ReclamationJob};
use crate::store::{AssignmentReason, CloseReason, LeadStatus};
use async_trait::async_trait;

const ACTOR: &str = "job:not-interested-recycle";

pub struct NotInterestedRecycleJob;

#[async_trait]
impl ReclamationJob for NotInterestedRecycleJob {
    fn name(&self) -> &'static str {
        "Not Interested Lead Recycling"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.not_interested_recycle.enabled"
    }

    fn respects_office_hours(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        // Setup failure, not a per-item one: without a fallback agent the
        // terminating attempt has nowhere to go.
        let fallback = ctx
            .config
            .fallback_agent_id
            .clone()
            .ok_or(JobError::MissingFallbackAgent)?;
        let ceiling = ctx.config.not_interested_max_assignments;

        let batch = ctx
            .store
            .leads_by_status(
                LeadStatus::NotInterested,
                None,
                Some(ceiling),
                ctx.config.batch_size,
            )
            .await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = batch.len();

        for lead in batch {
            let escalate = lead.assignment_count + 1 >= ceiling;
            let result = if escalate {
                ctx.orchestrator
                    .escalate_fallback(&lead.id, &fallback, ACTOR)
                    .await
            } else {
                ctx.orchestrator
                    .recycle_random(
                        &lead.id,
                        ACTOR,
                        AssignmentReason::NotInterestedRecycle,
                        CloseReason::NotInterestedRecycled,
                        false,
                    )
                    .await
            };
            match result {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    tracing::debug!(
                        lead_id = %lead.id,
                        to_agent = %outcome.agent_id,
                        escalated = escalate,
                        "recycled not-interested lead"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(lead_id = %lead.id, error = %e, "recycle failed");
                }
            }
        }

        Ok(record_summary(ctx, summary))
    }
}
