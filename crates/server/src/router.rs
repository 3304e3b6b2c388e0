//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;


/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/api/v1/calculate", axum::routing::post(api::calculate))
        .route("/api/v1/expressions", get(api::list_expressions))
        .route("/api/v1/expressions/{id}", get(api::get_expression))
        .route("/internal/task", get(api::next_task).post(api::submit_result))
        .route("/internal/task/{id}", get(api::task_status))
        .route("/internal/metrics", get(api::metrics))
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

/// `*` allows any origin; anything else is used as the single allowed origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::permissive().allow_origin(value),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}
