//! Liveness-style routes: `/`, `/health`, `/status`, `/api/v1/health`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use super::{AppState, ROUTES};

/// `GET /`: service banner plus the list of available routes.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Test API is running",
        "status": "healthy",
        "endpoints": ROUTES,
    }))
}

/// `GET /health`: always 200 with `{"status": "healthy", ...}`.
///
/// No dependencies, never blocks. Safe as a container liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service = &state.config.service;
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": service.name,
            "version": service.version,
        })),
    )
}

/// `GET /status`: run state and uptime.
///
/// Reports `shutting_down` while in-flight requests drain after a
/// termination signal.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let run_state = if state.shutdown.is_cancelled() {
        "shutting_down"
    } else {
        "running"
    };
    Json(json!({
        "status": run_state,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "service": state.config.service.name,
    }))
}

/// `GET /api/v1/health`
pub async fn api_v1_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "api_version": "v1",
        "status": "healthy",
        "service": state.config.service.name,
    }))
}
