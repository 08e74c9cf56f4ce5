//! No-activity rotation.
//!
//! Takes leads whose open assignment has gone quiet past the configured
//! threshold and routes them back through the source's round-robin ring.
//! The new edge is written with its loop guard set in the same transaction,
//! so a pool with no other eligible agent can never bounce the same lead
//! to itself tick after tick; only fresh agent activity clears the guard.

use super::{gate, record_skip, record_summary, JobContext, JobError, JobSummary, ReclamationJob};
use async_trait::async_trait;
use chrono::Duration;

const ACTOR: &str = "job:no-activity-rotation";

pub struct NoActivityRotationJob;

#[async_trait]
impl ReclamationJob for NoActivityRotationJob {
    fn name(&self) -> &'static str {
        "No Activity Lead Rotation"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.no_activity_rotation.enabled"
    }

    fn respects_office_hours(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        let threshold = ctx.clock.now() - Duration::minutes(ctx.config.no_activity_minutes);
        let batch = ctx
            .store
            .stale_open_assignments(threshold, ctx.config.batch_size)
            .await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = batch.len();

        for (lead, edge) in batch {
            match ctx.orchestrator.rotate_no_activity(&lead.id, ACTOR).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    tracing::debug!(
                        lead_id = %lead.id,
                        from_agent = %edge.agent_id,
                        to_agent = %outcome.agent_id,
                        "rotated stale lead"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(lead_id = %lead.id, error = %e, "rotation failed");
                }
            }
        }

        Ok(record_summary(ctx, summary))
    }
}
