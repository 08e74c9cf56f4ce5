//! Reclamation jobs: the recurring sweeps that recover stale ownership.
//!
//! Every job shares one shape: check the settings gate (and, for rotation
//! jobs, office hours) and skip with a log if closed; query a bounded FIFO
//! batch; process candidates sequentially, catching and logging per-item
//! failures so one bad record never aborts the batch; and record a
//! structured summary to the activity log. A failure before the batch query
//! aborts the run as a job-level failure instead.

pub mod error;
pub mod fresh_demotion;
pub mod no_activity;
pub mod no_answer;
pub mod not_interested;
pub mod reminders;

#[cfg(test)]
mod tests;

pub use error::JobError;
pub use fresh_demotion::FreshLeadDemotionJob;
pub use no_activity::NoActivityRotationJob;
pub use no_answer::NoAnswerRecycleJob;
pub use not_interested::NotInterestedRecycleJob;
pub use reminders::{CallReminderJob, DailyDigestJob};

use crate::activity::ActivityLog;
use crate::assignment::Orchestrator;
use crate::config::RotationConfig;
use crate::notify::NotificationSender;
use crate::scheduler::Clock;
use crate::settings::SettingsGate;
use crate::store::EntityStore;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Everything a job needs to run. Owned by the scheduler, injected per run;
/// jobs themselves hold no state.
pub struct JobContext {
    pub store: Arc<dyn EntityStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub settings: Arc<dyn SettingsGate>,
    pub activity: Arc<dyn ActivityLog>,
    pub notifier: Arc<dyn NotificationSender>,
    pub clock: Arc<dyn Clock>,
    pub config: RotationConfig,
}

/// Structured result of one job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job: &'static str,
    /// Candidates the batch query returned.
    pub processed: usize,
    /// Candidates handled successfully (rotated, demoted, or notified).
    pub succeeded: usize,
    /// Candidates that failed individually; the batch continued past them.
    pub failed: usize,
    /// Set when the gate closed the run before any batch query.
    pub skipped: Option<String>,
}

impl JobSummary {
    pub fn new(job: &'static str) -> Self {
        Self {
            job,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: None,
        }
    }

    pub fn skipped(job: &'static str, reason: &str) -> Self {
        Self {
            job,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: Some(reason.to_string()),
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

impl std::fmt::Display for JobSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.skipped {
            Some(reason) => write!(f, "{}: skipped ({})", self.job, reason),
            None => write!(
                f,
                "{}: processed={} succeeded={} failed={}",
                self.job, self.processed, self.succeeded, self.failed
            ),
        }
    }
}

/// A periodic reclamation or reminder sweep.
#[async_trait]
pub trait ReclamationJob: Send + Sync {
    /// Human-facing job name, also the scheduler registry key.
    fn name(&self) -> &'static str;

    /// Settings key gating this job.
    fn settings_key(&self) -> &'static str;

    /// Whether the office-hours gate applies.
    fn respects_office_hours(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobSummary, JobError>;
}

/// Evaluate the gates for a job. Returns the skip reason if the run must
/// not proceed.
pub(crate) fn gate(job: &dyn ReclamationJob, ctx: &JobContext) -> Option<&'static str> {
    if !ctx.settings.is_enabled(job.settings_key()) {
        return Some("disabled");
    }
    if job.respects_office_hours() && !ctx.settings.is_within_office_hours() {
        return Some("outside office hours");
    }
    None
}

/// Log the skip and record it to the activity log.
pub(crate) fn record_skip(job: &dyn ReclamationJob, ctx: &JobContext, reason: &str) -> JobSummary {
    tracing::info!(job = job.name(), reason = reason, "job skipped");
    ctx.activity.record(
        "job.skipped",
        job.name(),
        "scheduler",
        serde_json::json!({ "reason": reason }),
    );
    JobSummary::skipped(job.name(), reason)
}

/// Record the run summary to the activity log and metrics.
pub(crate) fn record_summary(ctx: &JobContext, summary: JobSummary) -> JobSummary {
    tracing::info!(
        job = summary.job,
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "job completed"
    );
    ctx.activity.record(
        "job.completed",
        summary.job,
        "scheduler",
        serde_json::to_value(&summary).unwrap_or_default(),
    );
    metrics::counter!("rotor_job_items_total",
        "job" => summary.job, "result" => "succeeded"
    )
    .increment(summary.succeeded as u64);
    metrics::counter!("rotor_job_items_total",
        "job" => summary.job, "result" => "failed"
    )
    .increment(summary.failed as u64);
    summary
}
