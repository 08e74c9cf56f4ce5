//! Output formatting helpers for CLI commands

use crate::config::JobSchedule;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for pool display
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolView {
    pub source_id: String,
    /// Ring members in rotation order
    pub members: Vec<PoolMemberView>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolMemberView {
    pub agent_id: String,
    pub next_in_rotation: bool,
    pub eligible: bool,
}

/// View model for job schedule display
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobView {
    pub name: String,
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl JobView {
    pub fn new(name: &str, schedule: &JobSchedule) -> Self {
        Self {
            name: name.to_string(),
            enabled: schedule.enabled,
            interval_seconds: schedule.interval_seconds,
        }
    }
}

/// Format pools as a table
pub fn format_pools_table(pools: &[PoolView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Source", "Agent", "Next", "Eligible"]);

    for pool in pools {
        for member in &pool.members {
            let next = if member.next_in_rotation {
                "→".green().to_string()
            } else {
                String::new()
            };
            let eligible = if member.eligible {
                "yes".green().to_string()
            } else {
                "no".red().to_string()
            };
            table.add_row(vec![
                Cell::new(&pool.source_id),
                Cell::new(&member.agent_id),
                Cell::new(next),
                Cell::new(eligible),
            ]);
        }
    }

    table.to_string()
}

/// Format pools as JSON
pub fn format_pools_json(pools: &[PoolView]) -> String {
    serde_json::to_string_pretty(&json!({ "pools": pools })).unwrap()
}

/// Format job schedules as a table
pub fn format_jobs_table(jobs: &[JobView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Job", "Enabled", "Interval"]);

    for job in jobs {
        let enabled = if job.enabled {
            "enabled".green().to_string()
        } else {
            "disabled".red().to_string()
        };
        table.add_row(vec![
            Cell::new(&job.name),
            Cell::new(enabled),
            Cell::new(format_interval(job.interval_seconds)),
        ]);
    }

    table.to_string()
}

/// Format job schedules as JSON
pub fn format_jobs_json(jobs: &[JobView]) -> String {
    serde_json::to_string_pretty(&json!({ "jobs": jobs })).unwrap()
}

/// Render an interval compactly: "90s", "15m", "24h".
pub fn format_interval(seconds: u64) -> String {
    if seconds % 3600 == 0 && seconds >= 3600 {
        format!("{}h", seconds / 3600)
    } else if seconds % 60 == 0 && seconds >= 60 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}s", seconds)
    }
}
