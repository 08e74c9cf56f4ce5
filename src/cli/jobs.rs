//! Jobs command implementation

use crate::cli::output::{format_jobs_json, format_jobs_table, JobView};
use crate::cli::JobsListArgs;
use crate::config::RotorConfig;

/// Handle `rotor jobs list`.
pub fn handle_jobs_list(
    args: &JobsListArgs,
    config: &RotorConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let jobs = &config.jobs;
    let views = vec![
        JobView::new("No Activity Lead Rotation", &jobs.no_activity_rotation),
        JobView::new("No Answer Lead Recycling", &jobs.no_answer_recycle),
        JobView::new("Not Interested Lead Recycling", &jobs.not_interested_recycle),
        JobView::new("Fresh Lead Demotion", &jobs.fresh_lead_demotion),
        JobView::new("Call Reminders", &jobs.call_reminders),
        JobView::new("Daily Digest", &jobs.daily_digest),
    ];

    if args.json {
        Ok(format_jobs_json(&views))
    } else {
        Ok(format_jobs_table(&views))
    }
}
