//! Per-job scheduling configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Schedule for one job: armed flag plus tick interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSchedule {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl JobSchedule {
    fn every(interval_seconds: u64) -> Self {
        Self {
            enabled: true,
            interval_seconds,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for JobSchedule {
    fn default() -> Self {
        Self::every(900)
    }
}

/// Schedules for every registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub no_activity_rotation: JobSchedule,
    pub no_answer_recycle: JobSchedule,
    pub not_interested_recycle: JobSchedule,
    pub fresh_lead_demotion: JobSchedule,
    pub call_reminders: JobSchedule,
    pub daily_digest: JobSchedule,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            no_activity_rotation: JobSchedule::every(900),
            no_answer_recycle: JobSchedule::every(1800),
            not_interested_recycle: JobSchedule::every(3600),
            fresh_lead_demotion: JobSchedule::every(3600),
            call_reminders: JobSchedule::every(300),
            daily_digest: JobSchedule::every(86_400),
        }
    }
}
