//! Health check handlers and response types.

use crate::constants::HEALTH_CHECK_TIMEOUT;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub(super) fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
}

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub rate_limit_store: String,
    pub store_backend: String,
    pub pipeline_mode: String,
}

/// Liveness probe - process is running.
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the rate limit store answers.
async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.rate_limiter.store().clone();
    let store_status = run_check(HEALTH_CHECK_TIMEOUT, store.ping(), "not_ready").await;

    if store_status == "healthy" {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "rate_limit_store": "ready" })),
        )
    } else {
        tracing::error!(status = %store_status, "Rate limit store readiness check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_ready", "rate_limit_store": store_status })),
        )
    }
}

/// Full health check.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.rate_limiter.store().clone();
    let rate_limit_store = run_check(HEALTH_CHECK_TIMEOUT, store.ping(), "unhealthy").await;
    let healthy = rate_limit_store == "healthy";

    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        rate_limit_store,
        store_backend: state.config.rate_limit_store().to_string(),
        pipeline_mode: format!("{:?}", state.orchestrator.config().mode).to_lowercase(),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
