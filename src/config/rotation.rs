//! Rotation thresholds and batch limits.

use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the reclamation jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Max candidates one job run processes. FIFO order guarantees leads
    /// beyond the cap are picked up on later ticks.
    pub batch_size: usize,
    /// Minutes without activity before an open assignment is rotated.
    pub no_activity_minutes: i64,
    /// No-answer leads older than this are left alone.
    pub no_answer_max_age_days: i64,
    /// Assignment-count ceiling for not-interested recycling; the attempt
    /// that reaches it routes to the fallback agent.
    pub not_interested_max_assignments: u32,
    /// Assignment count at which a lead loses fresh priority.
    pub fresh_demotion_threshold: u32,
    /// Agent receiving leads the pool has given up on.
    pub fallback_agent_id: Option<String>,
    /// Minutes a pending assignment may sit unaccepted before the call
    /// reminder fires.
    pub reminder_minutes: i64,
    /// Bound on each outbound notification send.
    pub notify_timeout_seconds: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            no_activity_minutes: 240,
            no_answer_max_age_days: 2,
            not_interested_max_assignments: 3,
            fresh_demotion_threshold: 2,
            fallback_agent_id: None,
            reminder_minutes: 30,
            notify_timeout_seconds: 5,
        }
    }
}

/// Office-hours window consulted by rotation jobs. Hours are half-open
/// `[start_hour, end_hour)` in UTC; a start after the end wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeHoursConfig {
    pub enforced: bool,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for OfficeHoursConfig {
    fn default() -> Self {
        Self {
            enforced: false,
            start_hour: 9,
            end_hour: 18,
        }
    }
}
