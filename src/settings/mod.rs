//! Settings and office-hours gate.
//!
//! Reclamation jobs consult this collaborator before touching any lead:
//! a per-job enable key and, for rotation jobs, an office-hours window.
//! The production gate lives in the CRM's settings service; `ConfigSettings`
//! is the in-process implementation backed by the engine's own config.

use crate::config::OfficeHoursConfig;
use crate::scheduler::Clock;
use chrono::Timelike;
use dashmap::DashMap;
use std::sync::Arc;

/// Read-only view the engine has of the CRM's settings service.
pub trait SettingsGate: Send + Sync {
    /// Raw setting value, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Whether rotation is allowed to run right now.
    fn is_within_office_hours(&self) -> bool;

    /// Feature-enable lookup. Unset keys default to enabled; only an
    /// explicit "false"/"0"/"off" disables a job.
    fn is_enabled(&self, key: &str) -> bool {
        match self.get(key) {
            Some(value) => !matches!(
                value.trim().to_lowercase().as_str(),
                "false" | "0" | "off" | "no"
            ),
            None => true,
        }
    }
}

/// Settings gate backed by the engine configuration.
pub struct ConfigSettings {
    values: DashMap<String, String>,
    office_hours: OfficeHoursConfig,
    clock: Arc<dyn Clock>,
}

impl ConfigSettings {
    pub fn new(
        values: impl IntoIterator<Item = (String, String)>,
        office_hours: OfficeHoursConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            values: values.into_iter().collect(),
            office_hours,
            clock,
        }
    }

    /// Runtime override, used by the admin surface and tests.
    pub fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl SettingsGate for ConfigSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    fn is_within_office_hours(&self) -> bool {
        if !self.office_hours.enforced {
            return true;
        }
        let hour = self.clock.now().hour();
        if self.office_hours.start_hour <= self.office_hours.end_hour {
            hour >= self.office_hours.start_hour && hour < self.office_hours.end_hour
        } else {
            // Window wraps midnight (e.g. 20:00 - 04:00).
            hour >= self.office_hours.start_hour || hour < self.office_hours.end_hour
        }
    }
}
