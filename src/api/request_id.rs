//! `X-Request-ID` propagation for the stub service.
//!
//! Probe runs send many near-identical GETs; the request ID lets a probe log
//! line be matched with the stub's own trace output. The ID is taken from the
//! incoming `X-Request-ID` header when present, otherwise a UUID v4 is
//! generated. It is echoed in the response and attached to a tracing span
//! around the handler.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument as _;
use uuid::Uuid;

pub const HEADER: &str = "x-request-id";

/// Apply inside `TraceLayer` so the span nests under the request span.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::debug_span!("request_id", id = %id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(HEADER, value);
    }

    response
}
