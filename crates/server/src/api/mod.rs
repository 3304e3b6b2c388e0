//! Endpoint modules.
//!
//! Shared error mapping and the owner extractor live here in mod.rs.

pub mod doc;
mod expressions;
mod health;
mod tasks;

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use calc_compute::{OrchestratorError, RegistryError};
use calc_core::CalcError;
use serde::Serialize;
use tracing::error;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error: a status code plus a message rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        let status = match &e {
            OrchestratorError::Compile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrchestratorError::Registry(RegistryError::UnknownTask(_)) => StatusCode::NOT_FOUND,
            OrchestratorError::Store(CalcError::ExpressionNotFound(_)) => StatusCode::NOT_FOUND,
            _ => {
                error!(error = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, message: e.to_string() }
    }
}

// ── Owner extractor ──────────────────────────────────────────────

pub const OWNER_HEADER: &str = "x-owner-id";
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Opaque owner tag taken from the `X-Owner-Id` header.
///
/// Not authenticated; a missing or unreadable header maps to `anonymous`.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS_OWNER);
        Ok(OwnerId(owner.to_string()))
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use expressions::{calculate, get_expression, list_expressions, ExpressionEnvelope, ExpressionList};
pub use health::{health, metrics, HealthResponse};
pub use tasks::{next_task, submit_result, task_status};
