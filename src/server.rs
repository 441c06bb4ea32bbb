//! Stub service serving loop and graceful shutdown.
//!
//! Shutdown is driven by a [`CancellationToken`] rather than a global flag:
//! the signal listener cancels it, `/status` observes it, and
//! [`axum::serve`] stops accepting connections once it fires while letting
//! in-flight requests finish.

use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{self, AppState};

/// Serve the stub routes on `listener` until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();

    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO));

    let app = api::router(state)
        .layer(axum::middleware::from_fn(api::request_id::request_id_middleware))
        .layer(trace_layer);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("stub service error")?;

    info!("stub service stopped");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => return,
    }

    info!("shutdown signal received, draining in-flight requests");
    token.cancel();
}
