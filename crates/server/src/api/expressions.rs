//! Submission API: accept expressions and report their status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use calc_core::{Expression, ExpressionInput, SubmitResponse};
use serde::Serialize;

use crate::state::AppState;

use super::{ApiError, OwnerId};

#[derive(Serialize, utoipa::ToSchema)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ExpressionEnvelope {
    pub expression: Expression,
}

/// Submit an expression for distributed evaluation.
///
/// Malformed input is rejected with 422 before anything is stored.
#[utoipa::path(
    post,
    path = "/api/v1/calculate",
    tag = "Expressions",
    request_body = ExpressionInput,
    params(
        ("X-Owner-Id" = Option<String>, Header, description = "Owner tag, defaults to `anonymous`")
    ),
    responses(
        (status = 201, description = "Expression accepted", body = SubmitResponse),
        (status = 422, description = "Malformed expression", body = super::ErrorResponse)
    )
)]
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(input): Json<ExpressionInput>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let id = state.orchestrator.submit(&owner, &input.expression).await?;
    Ok((StatusCode::CREATED, Json(SubmitResponse { id })))
}

/// List the caller's expressions, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/expressions",
    tag = "Expressions",
    params(
        ("X-Owner-Id" = Option<String>, Header, description = "Owner tag, defaults to `anonymous`")
    ),
    responses(
        (status = 200, description = "Expressions of the owner", body = ExpressionList)
    )
)]
pub async fn list_expressions(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
) -> Result<Json<ExpressionList>, ApiError> {
    let expressions = state.orchestrator.expressions(&owner).await?;
    Ok(Json(ExpressionList { expressions }))
}

/// Get one expression by ID.
#[utoipa::path(
    get,
    path = "/api/v1/expressions/{id}",
    tag = "Expressions",
    params(
        ("id" = String, Path, description = "Expression ID"),
        ("X-Owner-Id" = Option<String>, Header, description = "Owner tag, defaults to `anonymous`")
    ),
    responses(
        (status = 200, description = "Expression status and result", body = ExpressionEnvelope),
        (status = 404, description = "Unknown expression", body = super::ErrorResponse)
    )
)]
pub async fn get_expression(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<ExpressionEnvelope>, ApiError> {
    state
        .orchestrator
        .expression(&id, &owner)
        .await?
        .map(|expression| Json(ExpressionEnvelope { expression }))
        .ok_or_else(|| ApiError::not_found(format!("expression {} not found", id)))
}
