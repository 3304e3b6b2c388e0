//! Health and registry metrics endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use calc_compute::RegistryMetrics;
use serde::Serialize;

use crate::state::AppState;

use super::ApiError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Task registry snapshot: queue depth, per-state counts and task ages.
#[utoipa::path(
    get,
    path = "/internal/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Registry metrics", body = Object)
    )
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Json<RegistryMetrics>, ApiError> {
    Ok(Json(state.orchestrator.metrics()?))
}
