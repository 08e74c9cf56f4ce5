//! # Metrics Collection Module
//!
//! Prometheus export and a JSON stats API for dashboards.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `rotor_assignments_total{reason}` - Assignments written, by reason
//! - `rotor_rejections_total` - Assignments rejected by agents
//! - `rotor_job_items_total{job, result}` - Job batch items processed
//!
//! **Gauges:**
//! - `rotor_pools_total` - Rotation pools registered
//! - `rotor_pool_members{source}` - Ring size per lead source
//! - `rotor_agents_eligible` - Agents currently eligible for leads

pub mod handler;
pub mod types;

pub use types::*;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::pool::PoolRegistry;
use crate::store::EntityStore;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static RECORDER_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Central coordinator for metrics collection and gauge computation.
pub struct MetricsCollector {
    pool: Arc<PoolRegistry>,
    store: Arc<dyn EntityStore>,
    /// Engine startup time for uptime calculation
    start_time: Instant,
    /// Prometheus handle for rendering metrics
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        pool: Arc<PoolRegistry>,
        store: Arc<dyn EntityStore>,
        start_time: Instant,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        Self {
            pool,
            store,
            start_time,
            prometheus_handle,
        }
    }

    /// Update pool and agent gauges from current registry state.
    pub async fn update_gauges(&self) {
        let sources = self.pool.source_ids();
        metrics::gauge!("rotor_pools_total").set(sources.len() as f64);
        for source in sources {
            let count = self.pool.member_count(&source);
            metrics::gauge!("rotor_pool_members", "source" => source).set(count as f64);
        }

        if let Ok(eligible) = self.store.eligible_agents().await {
            metrics::gauge!("rotor_agents_eligible").set(eligible.len() as f64);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn pool(&self) -> &Arc<PoolRegistry> {
        &self.pool
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the process-wide Prometheus recorder on first call; every
/// later caller gets a handle to the same recorder, so gauges written
/// anywhere in the process render through every handle.
pub fn setup_metrics() -> PrometheusHandle {
    RECORDER_HANDLE
        .get_or_init(|| {
            // build_recorder needs no runtime, so this works from sync
            // contexts too.
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(Box::new(recorder)).is_err() {
                tracing::warn!(
                    "a global metrics recorder is already installed; rendered output may miss samples"
                );
            }
            handle
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Agent, MemoryStore};

    fn collector() -> MetricsCollector {
        MetricsCollector::new(
            Arc::new(PoolRegistry::new()),
            Arc::new(MemoryStore::new()),
            Instant::now(),
            setup_metrics(),
        )
    }

    #[test]
    fn uptime_starts_near_zero() {
        assert!(collector().uptime_seconds() < 1);
    }

    #[tokio::test]
    async fn gauges_reflect_pool_and_agent_state() {
        let pool = Arc::new(PoolRegistry::new());
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_agent(Agent::new("a1".to_string(), "Agent One".to_string()))
            .await
            .unwrap();
        pool.add_member("portal", "a1").unwrap();

        let collector = MetricsCollector::new(
            pool,
            store as Arc<dyn EntityStore>,
            Instant::now(),
            setup_metrics(),
        );
        collector.update_gauges().await;

        let rendered = collector.render_metrics();
        assert!(rendered.contains("rotor_pools_total"));
        assert!(rendered.contains("rotor_pool_members"));
    }

    #[test]
    fn every_setup_call_shares_one_recorder() {
        let first = setup_metrics();
        let second = setup_metrics();

        metrics::gauge!("rotor_recorder_sharing_check").set(7.0);
        assert!(first.render().contains("rotor_recorder_sharing_check"));
        assert!(second.render().contains("rotor_recorder_sharing_check"));
    }

    #[test]
    fn render_is_always_valid_text() {
        let rendered = collector().render_metrics();
        // Scrapers tolerate empty output but not panics.
        assert!(rendered.is_ascii());
    }
}
