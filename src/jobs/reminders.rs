//! Reminder sweeps.
//!
//! Read-only jobs that share the reclamation gate/batch/summary shape but
//! never mutate ownership: a call reminder for assignments sitting
//! unaccepted, and a daily digest of open-lead counts per agent.

use super::{gate, record_skip, record_summary, JobContext, JobError, JobSummary, ReclamationJob};
use crate::notify;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

/// Nudges agents who have not accepted a pending assignment in time.
pub struct CallReminderJob;

#[async_trait]
impl ReclamationJob for CallReminderJob {
    fn name(&self) -> &'static str {
        "Call Reminders"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.call_reminders.enabled"
    }

    fn respects_office_hours(&self) -> bool {
        // Do-not-disturb: never page agents outside office hours.
        true
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        let threshold = ctx.clock.now() - Duration::minutes(ctx.config.reminder_minutes);
        let batch = ctx
            .store
            .pending_unaccepted(threshold, ctx.config.batch_size)
            .await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = batch.len();

        for (lead, edge) in batch {
            notify::dispatch(
                Arc::clone(&ctx.notifier),
                edge.agent_id.clone(),
                format!("Reminder: lead '{}' is still awaiting acceptance", lead.name),
                std::time::Duration::from_secs(ctx.config.notify_timeout_seconds),
            );
            summary.succeeded += 1;
        }

        Ok(record_summary(ctx, summary))
    }
}

/// Sends each agent their open-lead count once a day.
pub struct DailyDigestJob;

#[async_trait]
impl ReclamationJob for DailyDigestJob {
    fn name(&self) -> &'static str {
        "Daily Digest"
    }

    fn settings_key(&self) -> &'static str {
        "jobs.daily_digest.enabled"
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError> {
        if let Some(reason) = gate(self, ctx) {
            return Ok(record_skip(self, ctx, reason));
        }

        let counts = ctx.store.open_counts_by_agent().await?;

        let mut summary = JobSummary::new(self.name());
        summary.processed = counts.len();

        for (agent_id, open) in counts {
            notify::dispatch(
                Arc::clone(&ctx.notifier),
                agent_id,
                format!("Daily digest: you have {} open lead(s)", open),
                std::time::Duration::from_secs(ctx.config.notify_timeout_seconds),
            );
            summary.succeeded += 1;
        }

        Ok(record_summary(ctx, summary))
    }
}
