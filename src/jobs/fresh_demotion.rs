//! Fresh-lead demotion.
//!
//! A pure state transition: leads reassigned past the threshold lose
//! their fresh-lead priority flag. No ownership changes here; downstream
//! prioritization consumes the flag.

use super::{gate, record_skip, record_summary, JobContext, JobError, JobSummary, ReclamationJob};
use async_trait::async_trait;

pub struct FreshLeadDemotionJob;

#[async_trait]
impl ReclamationJob for FreshLeadDemotionJob {
    fn name(&self) -> &'static str {
        "Fresh Lead Demotion"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.fresh_lead_demotion.enabled"
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        let batch = ctx
            .store
            .fresh_leads(ctx.config.fresh_demotion_threshold, ctx.config.batch_size)
            .await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = batch.len();

        for lead in batch {
            match ctx.store.demote_fresh(&lead.id, ctx.clock.now()).await {
                Ok(changed) => {
                    if changed {
                        summary.succeeded += 1;
                        tracing::debug!(lead_id = %lead.id, "demoted fresh lead");
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(lead_id = %lead.id, error = %e, "demotion failed");
                }
            }
        }

        Ok(record_summary(ctx, summary))
    }
}
