//! Interval scheduler for reclamation jobs.
//!
//! Each registered job gets its own background loop ticking at the job's
//! configured interval. Ticks that land while a previous run is still in
//! progress are skipped rather than queued, so a slow batch never piles up
//! behind itself. Manual triggers from the admin surface go through the same
//! run path as interval ticks, which means a disabled job answers a trigger
//! with the same "disabled" skip a tick would produce.

mod clock;
pub mod error;


pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SchedulerError;

use crate::config::{JobSchedule, JobsConfig};
use crate::jobs::{
    CallReminderJob, DailyDigestJob, FreshLeadDemotionJob, JobContext, JobSummary,
    NoActivityRotationJob, NoAnswerRecycleJob, NotInterestedRecycleJob, ReclamationJob,
};
use crate::settings::ConfigSettings;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct JobEntry {
    job: Arc<dyn ReclamationJob>,
    schedule: JobSchedule,
    /// Overlap guard. A tick or trigger that finds this held skips the run.
    running: Mutex<()>,
    last_run: std::sync::RwLock<Option<LastRun>>,
    next_due: std::sync::RwLock<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize)]
struct LastRun {
    at: DateTime<Utc>,
    outcome: String,
}

/// Snapshot of one job's scheduling state, for the admin API and CLI.
#[derive(Debug, Clone, Serialize)]
pub struct JobHealth {
    pub name: &'static str,
    pub enabled: bool,
    pub interval_seconds: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
    /// Human-readable estimate of the next interval tick.
    pub next_run: Option<String>,
}

/// Owns the job registry and the per-job background loops.
pub struct Scheduler {
    ctx: Arc<JobContext>,
    settings: Arc<ConfigSettings>,
    entries: DashMap<&'static str, Arc<JobEntry>>,
}

impl Scheduler {
    pub fn new(ctx: Arc<JobContext>, settings: Arc<ConfigSettings>) -> Self {
        Self {
            ctx,
            settings,
            entries: DashMap::new(),
        }
    }

    /// Build a scheduler with the six standard jobs wired to their
    /// configured schedules.
    pub fn with_default_jobs(
        ctx: Arc<JobContext>,
        settings: Arc<ConfigSettings>,
        jobs: &JobsConfig,
    ) -> Self {
        let scheduler = Self::new(ctx, settings);
        scheduler.register(
            Arc::new(NoActivityRotationJob),
            jobs.no_activity_rotation.clone(),
        );
        scheduler.register(Arc::new(NoAnswerRecycleJob), jobs.no_answer_recycle.clone());
        scheduler.register(
            Arc::new(NotInterestedRecycleJob),
            jobs.not_interested_recycle.clone(),
        );
        scheduler.register(
            Arc::new(FreshLeadDemotionJob),
            jobs.fresh_lead_demotion.clone(),
        );
        scheduler.register(Arc::new(CallReminderJob), jobs.call_reminders.clone());
        scheduler.register(Arc::new(DailyDigestJob), jobs.daily_digest.clone());
        scheduler
    }

    /// Register a job under its own name. A schedule disabled in config
    /// seeds the runtime settings gate, so the loop still runs but every
    /// tick reports a "disabled" skip until the job is enabled.
    pub fn register(&self, job: Arc<dyn ReclamationJob>, schedule: JobSchedule) {
        if !schedule.enabled {
            self.settings.set(job.settings_key(), "false");
        }
        let name = job.name();
        self.entries.insert(
            name,
            Arc::new(JobEntry {
                job,
                schedule,
                running: Mutex::new(()),
                last_run: std::sync::RwLock::new(None),
                next_due: std::sync::RwLock::new(None),
            }),
        );
    }

    fn entry(&self, name: &str) -> Result<Arc<JobEntry>, SchedulerError> {
        self.entries
            .get(name)
            .map(|e| Arc::clone(&e))
            .ok_or_else(|| SchedulerError::UnknownJob(name.to_string()))
    }

    /// Run one job once, through the same path interval ticks use. The
    /// settings and office-hours gates are evaluated inside the job itself.
    pub async fn run_once(&self, name: &str) -> Result<JobSummary, SchedulerError> {
        let entry = self.entry(name)?;
        self.run_entry(&entry).await
    }

    async fn run_entry(&self, entry: &JobEntry) -> Result<JobSummary, SchedulerError> {
        let name = entry.job.name();
        let Ok(_guard) = entry.running.try_lock() else {
            tracing::warn!(job = name, "previous run still in progress, skipping");
            return Ok(JobSummary::skipped(name, "previous run still in progress"));
        };

        let now = self.ctx.clock.now();
        let result = entry.job.run(&self.ctx).await;
        let outcome = match &result {
            Ok(summary) => summary.to_string(),
            Err(e) => format!("{}: error: {}", name, e),
        };
        if let Ok(mut last) = entry.last_run.write() {
            *last = Some(LastRun { at: now, outcome });
        }

        match result {
            Ok(summary) => Ok(summary),
            Err(source) => {
                tracing::error!(job = name, error = %source, "job run failed");
                Err(SchedulerError::JobFailed { job: name, source })
            }
        }
    }

    /// Manual trigger from the admin surface.
    pub async fn trigger(&self, name: &str) -> Result<JobSummary, SchedulerError> {
        tracing::info!(job = name, "manual trigger");
        self.run_once(name).await
    }

    pub fn enable(&self, name: &str) -> Result<(), SchedulerError> {
        let entry = self.entry(name)?;
        self.settings.set(entry.job.settings_key(), "true");
        tracing::info!(job = name, "job enabled");
        Ok(())
    }

    pub fn disable(&self, name: &str) -> Result<(), SchedulerError> {
        let entry = self.entry(name)?;
        self.settings.set(entry.job.settings_key(), "false");
        tracing::info!(job = name, "job disabled");
        Ok(())
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        names
    }

    /// Scheduling state for every registered job, sorted by name.
    pub fn health(&self) -> Vec<JobHealth> {
        let now = self.ctx.clock.now();
        let mut report: Vec<_> = self
            .entries
            .iter()
            .map(|e| {
                let last = e.last_run.read().ok().and_then(|l| l.clone());
                let next_due = e.next_due.read().ok().and_then(|n| *n);
                JobHealth {
                    name: e.job.name(),
                    enabled: self.ctx.settings.is_enabled(e.job.settings_key()),
                    interval_seconds: e.schedule.interval_seconds,
                    last_run_at: last.as_ref().map(|l| l.at),
                    last_outcome: last.map(|l| l.outcome),
                    next_run: next_due.map(|due| format_eta(due, now)),
                }
            })
            .collect();
        report.sort_by_key(|h| h.name);
        report
    }

    /// Start one background loop per registered job. Returns the handles;
    /// the loops stop when the token is cancelled.
    pub fn start(self: &Arc<Self>, cancel_token: CancellationToken) -> Vec<JoinHandle<()>> {
        self.entries
            .iter()
            .map(|e| {
                let scheduler = Arc::clone(self);
                let entry = Arc::clone(&e);
                let cancel = cancel_token.clone();
                tokio::spawn(async move {
                    let name = entry.job.name();
                    let period = entry.schedule.interval();
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                    // The first tick fires immediately; consume it so jobs
                    // start one full interval after boot.
                    interval.tick().await;

                    tracing::info!(
                        job = name,
                        interval_seconds = entry.schedule.interval_seconds,
                        "job loop started"
                    );

                    loop {
                        if let Ok(mut due) = entry.next_due.write() {
                            *due = Some(
                                scheduler.ctx.clock.now()
                                    + chrono::Duration::seconds(
                                        entry.schedule.interval_seconds as i64,
                                    ),
                            );
                        }
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                tracing::info!(job = name, "job loop shutting down");
                                break;
                            }
                            _ = interval.tick() => {
                                // Per-run errors are already logged and
                                // recorded; the loop keeps ticking.
                                let _ = scheduler.run_entry(&entry).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

/// Human-readable time until `due`, e.g. "in 4m 30s" or "overdue".
fn format_eta(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = (due - now).num_seconds();
    if remaining <= 0 {
        return "overdue".to_string();
    }
    let (h, m, s) = (remaining / 3600, (remaining % 3600) / 60, remaining % 60);
    if h > 0 {
        format!("in {}h {}m", h, m)
    } else if m > 0 {
        format!("in {}m {}s", m, s)
    } else {
        format!("in {}s", s)
    }
}
