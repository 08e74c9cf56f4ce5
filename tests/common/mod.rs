//! Shared fixtures for integration tests.

use chrono::{TimeZone, Utc};
use rotor::activity::MemoryActivityLog;
use rotor::assignment::Orchestrator;
use rotor::config::{OfficeHoursConfig, RotationConfig};
use rotor::jobs::JobContext;
use rotor::notify::LogSender;
use rotor::pool::PoolRegistry;
use rotor::rotation::Selector;
use rotor::scheduler::{Clock, ManualClock};
use rotor::settings::ConfigSettings;
use rotor::store::{Agent, EntityStore, Lead, LeadStatus, MemoryStore};
use std::sync::Arc;

pub struct Engine {
    pub store: Arc<MemoryStore>,
    pub pool: Arc<PoolRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub activity: Arc<MemoryActivityLog>,
    pub settings: Arc<ConfigSettings>,
    pub clock: Arc<ManualClock>,
    pub ctx: JobContext,
}

pub fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

/// Build a full engine with the given agents in one "portal" pool.
pub async fn engine_with_agents(agents: &[&str], config: RotationConfig) -> Engine {
    let store = Arc::new(MemoryStore::new());
    let pool = Arc::new(PoolRegistry::new());
    let clock = Arc::new(ManualClock::new(base_time()));

    for id in agents {
        store
            .upsert_agent(Agent::new(id.to_string(), id.to_string()))
            .await
            .unwrap();
        pool.add_member("portal", id).unwrap();
    }

    let settings = Arc::new(ConfigSettings::new(
        [],
        OfficeHoursConfig::default(),
        clock.clone() as Arc<dyn Clock>,
    ));
    let selector = Arc::new(Selector::new(
        pool.clone(),
        store.clone() as Arc<dyn EntityStore>,
    ));
    let activity = Arc::new(MemoryActivityLog::new());
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone() as Arc<dyn EntityStore>,
        selector,
        activity.clone(),
        Arc::new(LogSender),
        clock.clone() as Arc<dyn Clock>,
    ));
    let ctx = JobContext {
        store: store.clone() as Arc<dyn EntityStore>,
        orchestrator: orchestrator.clone(),
        settings: settings.clone(),
        activity: activity.clone(),
        notifier: Arc::new(LogSender),
        clock: clock.clone() as Arc<dyn Clock>,
        config,
    };

    Engine {
        store,
        pool,
        orchestrator,
        activity,
        settings,
        clock,
        ctx,
    }
}

/// Insert a lead into the "portal" source with the given status.
pub async fn seed_lead(engine: &Engine, id: &str, status: LeadStatus) {
    let mut lead = Lead::new(
        id.to_string(),
        format!("Lead {}", id),
        "portal".to_string(),
        engine.clock.now(),
    );
    lead.status = status;
    engine.store.insert_lead(lead).await.unwrap();
}
