//! Stub HTTP service: a fixed set of read-only routes the prober can target.
//!
//! Handlers share one immutable [`AppState`]. The only thing that changes
//! while the process runs is the shutdown token, which `/status` reports.

pub mod health;
pub mod info;
pub mod metrics;
pub mod request_id;

use std::{sync::Arc, time::Instant};

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Every route the stub serves, as listed by `GET /`.
pub const ROUTES: [&str; 7] = [
    "/",
    "/health",
    "/status",
    "/api/v1/health",
    "/metrics",
    "/config",
    "/api/v1/info",
];

/// Shared state injected into every handler via [`axum::extract::State`].
pub struct AppState {
    pub config: Arc<Config>,
    /// Process start time, for `/status` uptime.
    pub started_at: Instant,
    /// Cancelled once a termination signal arrives.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<Config>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            started_at: Instant::now(),
            shutdown,
        }
    }
}

/// Build the stub service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/api/v1/health", get(health::api_v1_health))
        .route("/metrics", get(metrics::metrics))
        .route("/config", get(info::config))
        .route("/api/v1/info", get(info::info))
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::{test_support, *};

    #[tokio::test]
    async fn every_listed_route_returns_200() {
        for route in ROUTES {
            let (status, _, _) = test_support::get(router(test_support::state()), route).await;
            assert_eq!(status, StatusCode::OK, "GET {route}");
        }
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (status, _, _) = test_support::get(router(test_support::state()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
