//! Job management endpoints.

use crate::api::{ApiError, AppState};
use crate::jobs::JobSummary;
use crate::scheduler::JobHealth;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

/// GET /jobs - Scheduling state of every registered job.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<JobHealth>> {
    Json(state.scheduler.health())
}

/// POST /jobs/:name/trigger - Run a job now.
///
/// Goes through the same run path as an interval tick, so a disabled job
/// answers with a "disabled" skip summary rather than running.
pub async fn trigger(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JobSummary>, ApiError> {
    let summary = state.scheduler.trigger(&name).await?;
    Ok(Json(summary))
}

/// POST /jobs/:name/enable
pub async fn enable(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.scheduler.enable(&name)?;
    Ok(Json(serde_json::json!({ "job": name, "enabled": true })))
}

/// POST /jobs/:name/disable
pub async fn disable(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.scheduler.disable(&name)?;
    Ok(Json(serde_json::json!({ "job": name, "enabled": false })))
}
