//! Activity log collaborator.
//!
//! Every ownership change and every job run summary lands here. Production
//! writes to the CRM's activity table; the engine ships a tracing-backed
//! recorder plus an in-memory one that tests and the admin surface can read
//! back.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// One recorded activity event.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub event_type: String,
    pub subject: String,
    pub actor: String,
    pub properties: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only event recorder.
pub trait ActivityLog: Send + Sync {
    fn record(&self, event_type: &str, subject: &str, actor: &str, properties: serde_json::Value);
}

/// Emits activity events as structured tracing records.
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn record(&self, event_type: &str, subject: &str, actor: &str, properties: serde_json::Value) {
        tracing::info!(
            event_type = %event_type,
            subject = %subject,
            actor = %actor,
            properties = %properties,
            "activity recorded"
        );
    }
}

/// Keeps events in memory for inspection. Used by tests and the in-process
/// binary.
#[derive(Default)]
pub struct MemoryActivityLog {
    events: Mutex<Vec<ActivityEvent>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().expect("activity lock poisoned").clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<ActivityEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record(&self, event_type: &str, subject: &str, actor: &str, properties: serde_json::Value) {
        let event = ActivityEvent {
            event_type: event_type.to_string(),
            subject: subject.to_string(),
            actor: actor.to_string(),
            properties,
            recorded_at: Utc::now(),
        };
        tracing::debug!(
            event_type = %event.event_type,
            subject = %event.subject,
            "activity recorded"
        );
        self.events.lock().expect("activity lock poisoned").push(event);
    }
}
