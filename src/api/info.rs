//! Descriptive routes: `/config` and `/api/v1/info`.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use super::AppState;

/// `GET /config`: the effective service configuration.
///
/// Contains no secrets; every field comes from the service config or the
/// `PORT` / `APP_VERSION` overrides.
pub async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cfg = &state.config;
    Json(json!({
        "service": cfg.service.name,
        "version": cfg.service.version,
        "environment": cfg.service.environment,
        "host": cfg.service.host,
        "port": cfg.service.port,
        "log_level": cfg.logging.level,
        "log_format": cfg.logging.format.to_string(),
    }))
}

/// `GET /api/v1/info`
pub async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service = &state.config.service;
    Json(json!({
        "name": service.name,
        "version": service.version,
        "description": service.description,
        "api_version": "v1",
    }))
}
