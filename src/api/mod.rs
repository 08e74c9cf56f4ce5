//! # Admin API
//!
//! Thin HTTP surface for operating the engine: health, metrics, and job
//! management. Lead assignment itself is driven by the surrounding CRM
//! through the library API, not over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /health` - Engine health with agent and pool counts
//! - `GET /metrics` - Prometheus text format metrics
//! - `GET /v1/stats` - JSON statistics for dashboards
//! - `GET /jobs` - Scheduling state of every registered job
//! - `POST /jobs/:name/trigger` - Run a job now, through the normal gates
//! - `POST /jobs/:name/enable` - Open a job's settings gate
//! - `POST /jobs/:name/disable` - Close a job's settings gate
//!
//! ## Example
//!
//! ```no_run
//! use rotor::api::{AppState, create_router};
//! use rotor::config::RotorConfig;
//! use rotor::pool::PoolRegistry;
//! use rotor::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example(scheduler: Arc<rotor::scheduler::Scheduler>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let pool = Arc::new(PoolRegistry::new());
//! let config = Arc::new(RotorConfig::default());
//!
//! let state = Arc::new(AppState::new(pool, store, scheduler, config));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8600").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod health;
mod jobs;

pub use error::ApiError;

use crate::config::RotorConfig;
use crate::metrics::MetricsCollector;
use crate::pool::PoolRegistry;
use crate::scheduler::Scheduler;
use crate::store::EntityStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Admin requests are short; anything slower is stuck.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub pool: Arc<PoolRegistry>,
    pub store: Arc<dyn EntityStore>,
    pub scheduler: Arc<Scheduler>,
    pub config: Arc<RotorConfig>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(
        pool: Arc<PoolRegistry>,
        store: Arc<dyn EntityStore>,
        scheduler: Arc<Scheduler>,
        config: Arc<RotorConfig>,
    ) -> Self {
        let start_time = Instant::now();

        // Process-wide recorder: repeated construction (tests, restarts)
        // reuses the same handle.
        let prometheus_handle = crate::metrics::setup_metrics();

        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&pool),
            Arc::clone(&store),
            start_time,
            prometheus_handle,
        ));

        Self {
            pool,
            store,
            scheduler,
            config,
            start_time,
            metrics_collector,
        }
    }
}

/// Create the admin router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/v1/stats", get(crate::metrics::handler::stats_handler))
        .route("/jobs", get(jobs::list))
        .route("/jobs/:name/trigger", post(jobs::trigger))
        .route("/jobs/:name/enable", post(jobs::enable))
        .route("/jobs/:name/disable", post(jobs::disable))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::MemoryActivityLog;
    use crate::assignment::Orchestrator;
    use crate::jobs::JobContext;
    use crate::notify::LogSender;
    use crate::rotation::Selector;
    use crate::scheduler::{Clock, SystemClock};
    use crate::settings::ConfigSettings;
    use crate::store::{Agent, MemoryStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_agent(Agent::new("a1".to_string(), "Agent One".to_string()))
            .await
            .unwrap();
        let pool = Arc::new(PoolRegistry::new());
        pool.add_member("portal", "a1").unwrap();
        let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
        let settings = Arc::new(ConfigSettings::new(
            [],
            Default::default(),
            clock.clone(),
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
            clock.clone(),
        ));
        let ctx = Arc::new(JobContext {
            store: store.clone() as Arc<dyn EntityStore>,
            orchestrator,
            settings: settings.clone(),
            activity,
            notifier: Arc::new(LogSender),
            clock,
            config: Default::default(),
        });
        let scheduler = Arc::new(Scheduler::with_default_jobs(
            ctx,
            settings,
            &Default::default(),
        ));
        Arc::new(AppState::new(
            pool,
            store as Arc<dyn EntityStore>,
            scheduler,
            Arc::new(RotorConfig::default()),
        ))
    }

    async fn send(state: Arc<AppState>, method: &str, uri: &str) -> StatusCode {
        let app = create_router(state);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_and_metrics_respond() {
        let state = test_state().await;
        assert_eq!(send(state.clone(), "GET", "/health").await, StatusCode::OK);
        assert_eq!(send(state.clone(), "GET", "/metrics").await, StatusCode::OK);
        assert_eq!(send(state, "GET", "/v1/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn jobs_listing_and_trigger() {
        let state = test_state().await;
        assert_eq!(send(state.clone(), "GET", "/jobs").await, StatusCode::OK);
        assert_eq!(
            send(state.clone(), "POST", "/jobs/Daily%20Digest/trigger").await,
            StatusCode::OK
        );
        assert_eq!(
            send(state, "POST", "/jobs/No%20Such%20Job/trigger").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn disable_then_trigger_reports_skip() {
        let state = test_state().await;
        assert_eq!(
            send(state.clone(), "POST", "/jobs/Daily%20Digest/disable").await,
            StatusCode::OK
        );
        // The trigger still succeeds; the body carries the skip summary.
        assert_eq!(
            send(state.clone(), "POST", "/jobs/Daily%20Digest/trigger").await,
            StatusCode::OK
        );
        assert_eq!(
            send(state, "POST", "/jobs/Daily%20Digest/enable").await,
            StatusCode::OK
        );
    }
}
