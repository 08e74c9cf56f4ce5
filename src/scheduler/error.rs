//! Scheduler error types.

use crate::jobs::JobError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Job '{job}' failed: {source}")]
    JobFailed {
        job: &'static str,
        #[source]
        source: JobError,
    },
}
