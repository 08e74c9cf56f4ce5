//! Notification sender collaborator.
//!
//! Assignment events notify the receiving agent. Delivery (email, SMS,
//! push) is an external concern; the engine fires and forgets, bounds every
//! send with a timeout, and logs failures without ever blocking an
//! assignment or a reclamation batch.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a notification sender can report. Failures are logged, never
/// propagated to the assignment path.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification send failed: {0}")]
    SendFailed(String),
}

/// Outbound notification channel to agents.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, agent_id: &str, message: &str) -> Result<(), NotifyError>;
}

/// Logs notifications instead of delivering them. The in-process default.
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, agent_id: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(agent_id = %agent_id, message = %message, "notification sent");
        Ok(())
    }
}

/// Fire-and-forget dispatch with a timeout bound. A hung sender cannot
/// stall the caller; the spawned task owns the send.
pub fn dispatch(
    sender: Arc<dyn NotificationSender>,
    agent_id: String,
    message: String,
    timeout: Duration,
) {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, sender.send(&agent_id, &message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(agent_id = %agent_id, error = %e, "notification failed");
            }
            Err(_) => {
                tracing::warn!(
                    agent_id = %agent_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "notification timed out"
                );
            }
        }
    });
}
