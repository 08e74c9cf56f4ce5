//! No-answer recycling.
//!
//! Young leads stuck in No Answer get handed to a uniformly random
//! different eligible agent, deliberately not the ring, so one agent's
//! unlucky calling window doesn't correlate across retries. Each recycle
//! bumps the lead's no-answer counter.

use super::{gate, record_skip, record_summary, JobContext, JobError, JobSummary, ReclamationJob};
use crate::store::{AssignmentReason, CloseReason, LeadStatus};
use async_trait::async_trait;
use chrono::Duration;

const ACTOR: &str = "job:no-answer-recycle";

pub struct NoAnswerRecycleJob;

#[async_trait]
impl ReclamationJob for NoAnswerRecycleJob {
    fn name(&self) -> &'static str {
        "No Answer Lead Recycling"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.no_answer_recycle.enabled"
    }

    fn respects_office_hours(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        // Only recycle while the lead is still young enough to be worth
        // another cold call.
        let oldest = ctx.clock.now() - Duration::days(ctx.config.no_answer_max_age_days);
        let batch = ctx
            .store
            .leads_by_status(LeadStatus::NoAnswer, Some(oldest), None, ctx.config.batch_size)
            .await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = batch.len();

        for lead in batch {
            match ctx
                .orchestrator
                .recycle_random(
                    &lead.id,
                    ACTOR,
                    AssignmentReason::NoAnswerRecycle,
                    CloseReason::NoAnswerRecycled,
                    true,
                )
                .await
            {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    tracing::debug!(
                        lead_id = %lead.id,
                        to_agent = %outcome.agent_id,
                        "recycled no-answer lead"
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
