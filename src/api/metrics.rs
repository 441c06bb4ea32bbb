//! Prometheus-compatible `/metrics` endpoint.
//!
//! The values are fixed: the stub exists to give the prober a text/plain
//! route to check, not to measure anything. Metric families:
//! - `test_api_requests_total`: constant counter
//! - `test_api_build_info`: gauge labelled with the service version

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use super::AppState;

/// `GET /metrics`: renders Prometheus text format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render(&state.config.service.version),
    )
}

fn render(version: &str) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("# HELP test_api_requests_total Total requests\n");
    out.push_str("# TYPE test_api_requests_total counter\n");
    out.push_str("test_api_requests_total 42\n");

    out.push_str("# HELP test_api_build_info Build information for the stub service.\n");
    out.push_str("# TYPE test_api_build_info gauge\n");
    out.push_str(&format!("test_api_build_info{{version=\"{version}\"}} 1\n"));

    out
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::render;
    use crate::api::{router, test_support};

    #[test]
    fn render_emits_help_type_and_sample_lines() {
        let text = render("1.2.3");
        assert!(text.contains("# TYPE test_api_requests_total counter\n"));
        assert!(text.contains("test_api_requests_total 42\n"));
        assert!(text.contains("test_api_build_info{version=\"1.2.3\"} 1\n"));
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn metrics_route_serves_prometheus_text() {
        let (status, content_type, body) =
            test_support::get(router(test_support::state()), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert!(body.contains("test_api_build_info{version=\"1.0.0\"} 1"));
    }
}
