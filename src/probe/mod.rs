//! Endpoint smoke-test harness.
//!
//! A run is linear:
//!
//! 1. load [`ProbeConfig`] (fatal on error),
//! 2. resolve targets: configured addresses, or [`discovery`] when none,
//! 3. [`matrix::build`] the address × endpoint cross product,
//! 4. probe every entry once, sequentially, and collect a [`RunReport`].
//!
//! The run fails only when a required endpoint failed.

pub mod client;
pub mod config;
pub mod discovery;
pub mod matrix;
pub mod report;

use tracing::{debug, error, info, warn};

pub use client::ProbeClient;
pub use config::{EndpointSpec, ProbeConfig};
pub use matrix::{TargetSource, TestMatrixEntry};
pub use report::{ProbeOutcome, ProbeResult, RunReport};

use crate::error::ProbeError;

/// Example URLs shown in the summary: this many addresses...
const SUMMARY_IPS: usize = 2;
/// ...times this many endpoints.
const SUMMARY_ENDPOINTS: usize = 3;

/// Probe every entry once, in order.
///
/// A required failure does not stop the run; later entries are still probed.
pub async fn run(entries: &[TestMatrixEntry]) -> RunReport {
    let mut report = RunReport::new();

    for entry in entries {
        let result = match ProbeClient::new(&entry.connection) {
            Ok(client) => client.probe(entry).await,
            Err(e) => {
                let location =
                    format!("{} on {}:{}", entry.endpoint.path, entry.ip_address, entry.port);
                ProbeResult::failure(
                    entry.endpoint.required,
                    None,
                    &ProbeError::Request(format!("{e:#}")),
                    &location,
                )
            }
        };
        report.push(entry.id(), entry.url(), result);
    }

    log_report(&report);
    report
}

/// Log what is about to be probed.
pub fn log_summary(config: &ProbeConfig, targets: &[String], source: TargetSource) {
    info!(source = %source, count = targets.len(), "target IP addresses");
    for ip in targets {
        info!("  - {ip}");
    }

    info!(default_port = config.default_port, "default port");

    info!(count = config.endpoints.len(), "endpoints to test");
    for endpoint in &config.endpoints {
        let kind = if endpoint.required { "required" } else { "optional" };
        info!("  - {} ({kind}): {}", endpoint.path, endpoint.description);
    }

    let conn = &config.connection_config;
    info!(
        timeout_secs = conn.timeout,
        allow_redirects = conn.allow_redirects,
        max_redirects = conn.max_redirects,
        "connection configuration"
    );
    for (name, value) in &conn.headers {
        info!("  header {name}: {value}");
    }

    info!(total = targets.len() * config.endpoints.len(), "total test combinations");
    for line in example_urls(targets, config.default_port, &config.endpoints) {
        info!("  {line}");
    }
}

/// Up to two addresses × three endpoints of example URLs, with "... and N
/// more" tails for whatever was left out.
pub fn example_urls(targets: &[String], port: u16, endpoints: &[EndpointSpec]) -> Vec<String> {
    let mut lines = Vec::new();
    for ip in targets.iter().take(SUMMARY_IPS) {
        for endpoint in endpoints.iter().take(SUMMARY_ENDPOINTS) {
            lines.push(format!("http://{ip}:{port}{}", endpoint.path));
        }
        if endpoints.len() > SUMMARY_ENDPOINTS {
            lines.push(format!("... and {} more endpoints", endpoints.len() - SUMMARY_ENDPOINTS));
        }
    }
    if targets.len() > SUMMARY_IPS {
        lines.push(format!("... and {} more IP addresses", targets.len() - SUMMARY_IPS));
    }
    lines
}

fn log_report(report: &RunReport) {
    let succeeded = report.count(ProbeOutcome::Success);
    let non_critical = report.count(ProbeOutcome::NonCriticalFailure);
    let required = report.count(ProbeOutcome::RequiredFailure);
    let elapsed_ms = (chrono::Utc::now() - report.started_at).num_milliseconds();

    for entry in report.required_failures() {
        error!(
            id = %entry.id,
            url = %entry.url,
            error = entry.result.error.as_deref().unwrap_or_default(),
            "required endpoint failed"
        );
    }

    match serde_json::to_string(report) {
        Ok(json) => debug!(report = %json, "run report"),
        Err(e) => warn!(error = %e, "could not serialize run report"),
    }

    if report.passed() {
        if non_critical > 0 {
            warn!(succeeded, non_critical, elapsed_ms, "probe run passed with non-critical failures");
        } else {
            info!(succeeded, elapsed_ms, "probe run passed");
        }
    } else {
        error!(succeeded, non_critical, required, elapsed_ms, "probe run failed");
    }
}
