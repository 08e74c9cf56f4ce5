//! Axum handlers for the metrics endpoints.

use super::{AgentStats, LeadStats, PoolStats, StatsResponse};
use crate::api::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashSet;
use std::sync::Arc;

/// GET /metrics - Prometheus exposition format.
///
/// Always returns 200 with the scraper content type, even before any metric
/// has been recorded.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics_collector.update_gauges().await;

    let metrics = state.metrics_collector.render_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics,
    )
}

/// GET /v1/stats - JSON statistics for dashboards and debugging.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics_collector.update_gauges().await;

    let uptime_seconds = state.metrics_collector.uptime_seconds();
    let leads = compute_lead_stats(&state).await;
    let agents = compute_agent_stats(&state).await;
    let pools = compute_pool_stats(&state).await;

    Json(StatsResponse {
        uptime_seconds,
        leads,
        agents,
        pools,
    })
}

async fn compute_lead_stats(state: &AppState) -> LeadStats {
    let counts = state.store.lead_counts().await.unwrap_or_default();
    LeadStats {
        total: counts.total,
        fresh: counts.fresh,
        unassigned: counts.unassigned,
    }
}

async fn compute_agent_stats(state: &AppState) -> AgentStats {
    let total = state.store.all_agents().await.map(|a| a.len()).unwrap_or(0);
    let eligible = state
        .store
        .eligible_agents()
        .await
        .map(|a| a.len())
        .unwrap_or(0);
    AgentStats { total, eligible }
}

async fn compute_pool_stats(state: &AppState) -> Vec<PoolStats> {
    let eligible: HashSet<String> = state
        .store
        .eligible_agents()
        .await
        .map(|agents| agents.into_iter().map(|a| a.id).collect())
        .unwrap_or_default();

    let mut sources = state.pool.source_ids();
    sources.sort_unstable();
    sources
        .into_iter()
        .map(|source_id| {
            let members = state.pool.members(&source_id);
            let eligible_members = members
                .iter()
                .filter(|m| eligible.contains(&m.agent_id))
                .count();
            PoolStats {
                next_in_rotation: state.pool.flagged(&source_id),
                members: members.len(),
                eligible: eligible_members,
                source_id,
            }
        })
        .collect()
}
