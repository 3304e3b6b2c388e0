//! Internal dispatch protocol used by workers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use calc_core::{Task, TaskResult, TaskStatusView};

use crate::state::AppState;

use super::ApiError;

/// Take the next task from the dispatch queue.
#[utoipa::path(
    get,
    path = "/internal/task",
    tag = "Tasks",
    responses(
        (status = 200, description = "Next task", body = Task),
        (status = 404, description = "No task available", body = super::ErrorResponse)
    )
)]
pub async fn next_task(State(state): State<Arc<AppState>>) -> Result<Json<Task>, ApiError> {
    state
        .orchestrator
        .next_task()?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no task available"))
}

/// Report a computed task result.
#[utoipa::path(
    post,
    path = "/internal/task",
    tag = "Tasks",
    request_body = TaskResult,
    responses(
        (status = 200, description = "Result recorded"),
        (status = 404, description = "Unknown task", body = super::ErrorResponse)
    )
)]
pub async fn submit_result(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TaskResult>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.complete_task(&body.id, body.result).await?;
    Ok(StatusCode::OK)
}

/// Dependency lookup: whether a task is done and its result.
#[utoipa::path(
    get,
    path = "/internal/task/{id}",
    tag = "Tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task status", body = TaskStatusView),
        (status = 404, description = "Unknown task", body = super::ErrorResponse)
    )
)]
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatusView>, ApiError> {
    state
        .orchestrator
        .task_status(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("task {} not found", id)))
}
