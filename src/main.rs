use std::{net::Ipv4Addr, path::Path, sync::Arc};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod api;
mod config;
mod error;
mod probe;
mod server;

pub use config::{Config, LogFormat};
pub use probe::ProbeConfig;

const USAGE: &str = "usage: endpoint-probe [serve | probe [CONFIG]]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => run_service().await,
        Some("probe") => run_probe(args.next()).await,
        Some("-h" | "--help") => {
            println!("{USAGE}");
            Ok(())
        }
        Some(other) => anyhow::bail!("unknown command `{other}`\n{USAGE}"),
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise this crate logs at `level` and
/// tower-http request spans only at warn.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("endpoint_probe={level},tower_http=warn").into());

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

/// `endpoint-probe serve`: run the stub service until SIGINT/SIGTERM.
async fn run_service() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.logging.level, config.logging.format);

    let addr = config.bind_addr()?;
    info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        "stub service starting"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "stub service listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(server::cancel_on_signal(shutdown.clone()));

    let state = Arc::new(api::AppState::new(Arc::new(config), shutdown));
    server::serve(listener, state).await
}

/// `endpoint-probe probe [CONFIG]`: probe every address × endpoint once.
///
/// Exits non-zero when the config cannot be loaded or any required endpoint
/// failed.
async fn run_probe(config_arg: Option<String>) -> anyhow::Result<()> {
    init_tracing("info", LogFormat::Text);

    let config_path = ProbeConfig::resolve_path(config_arg);
    probe_from_file(&config_path, probe::discovery::discover_private_ips).await?;
    Ok(())
}

/// Load `config_path`, resolve targets (calling `discover` only when the file
/// lists none), probe the matrix and fail when a required endpoint failed.
async fn probe_from_file<F>(config_path: &Path, discover: F) -> anyhow::Result<probe::RunReport>
where
    F: FnOnce() -> Vec<Ipv4Addr>,
{
    let config = ProbeConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let (targets, source) = probe::matrix::resolve_targets(&config, discover);
    probe::log_summary(&config, &targets, source);

    let entries = probe::matrix::build(
        &targets,
        config.default_port,
        &config.endpoints,
        &config.connection_config,
    );
    let report = probe::run(&entries).await;

    anyhow::ensure!(
        report.passed(),
        "{} required endpoint probe(s) failed",
        report.count(probe::ProbeOutcome::RequiredFailure)
    );
    Ok(report)
}
