//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub agents: AgentCounts,
    pub pools: usize,
    pub jobs: JobCounts,
}

#[derive(Debug, Serialize)]
pub struct AgentCounts {
    pub total: usize,
    pub eligible: usize,
}

#[derive(Debug, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub enabled: usize,
}

/// GET /health - Return engine health status.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let total = state.store.all_agents().await.map(|a| a.len()).unwrap_or(0);
    let eligible = state
        .store
        .eligible_agents()
        .await
        .map(|a| a.len())
        .unwrap_or(0);
    let pools = state.pool.source_ids().len();

    let job_health = state.scheduler.health();
    let enabled_jobs = job_health.iter().filter(|j| j.enabled).count();

    // Degraded means leads can still flow, but not to everyone.
    let status = match (eligible, total) {
        (e, t) if e == t && t > 0 => "healthy",
        (e, _) if e > 0 => "degraded",
        _ => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        agents: AgentCounts { total, eligible },
        pools,
        jobs: JobCounts {
            total: job_health.len(),
            enabled: enabled_jobs,
        },
    })
}
