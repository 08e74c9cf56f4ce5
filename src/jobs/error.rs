//! Error types for job-level failures.
//!
//! Per-item failures inside a batch are caught and counted by each job;
//! these errors are the setup-level failures that abort a whole run.

use crate::store::StoreError;
use thiserror::Error;

/// Failure that aborts a job run before or during its batch query.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Not-interested recycling cannot run without a fallback agent to
    /// terminate the cycle.
    #[error("no fallback agent configured")]
    MissingFallbackAgent,
}
