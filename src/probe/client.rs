//! HTTP client that probes a single matrix entry.
//!
//! A [`ProbeClient`] is built fresh per entry from its [`ConnectionConfig`].
//! Every entry carries its own timeout, headers and redirect policy, and
//! building per entry keeps the probe path stateless.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::{header, redirect, Client};
use tracing::{debug, info, warn};

use super::{
    config::ConnectionConfig,
    matrix::TestMatrixEntry,
    report::{body_preview, ProbeResult, ResponseDetails},
};
use crate::error::ProbeError;

pub struct ProbeClient {
    client: Client,
    timeout: Duration,
}

impl ProbeClient {
    /// Construct a client honouring the connection settings.
    ///
    /// Custom headers become default headers on every request. Redirects are
    /// disabled entirely when `allow_redirects` is false; otherwise at most
    /// `max_redirects` hops are followed.
    pub fn new(cfg: &ConnectionConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        for (name, value) in &cfg.headers {
            headers.insert(
                header::HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("invalid header name `{name}`"))?,
                header::HeaderValue::from_str(value)
                    .with_context(|| format!("invalid value for header `{name}`"))?,
            );
        }

        let policy = if cfg.allow_redirects {
            redirect::Policy::limited(cfg.max_redirects)
        } else {
            redirect::Policy::none()
        };

        let client = Client::builder()
            .default_headers(headers)
            .timeout(cfg.timeout())
            .redirect(policy)
            .build()
            .context("building reqwest client")?;

        Ok(Self {
            client,
            timeout: cfg.timeout(),
        })
    }

    /// Issue one GET for `entry` and classify the outcome.
    ///
    /// Never returns an error: transport failures and status mismatches are
    /// folded into the [`ProbeResult`] according to `entry.endpoint.required`.
    pub async fn probe(&self, entry: &TestMatrixEntry) -> ProbeResult {
        let url = entry.url();
        let location = format!("{} on {}:{}", entry.endpoint.path, entry.ip_address, entry.port);
        let expected = entry.endpoint.expected_status;
        let required = entry.endpoint.required;

        info!(
            url = %url,
            description = %entry.endpoint.description,
            expected_status = expected,
            "probing endpoint"
        );

        let (status, details) = match self.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let result = ProbeResult::failure(required, None, &e, &location);
                log_failure(required, &result);
                return result;
            }
        };

        debug!(
            status,
            size_bytes = details.size_bytes,
            latency_ms = details.latency_ms,
            content_type = details.content_type.as_deref().unwrap_or("unknown"),
            server = details.server.as_deref().unwrap_or("unknown"),
            preview = %details.preview,
            "response received"
        );

        if status != expected {
            let err = ProbeError::UnexpectedStatus {
                actual: status,
                expected,
            };
            let result = ProbeResult::failure(required, Some(status), &err, &location).with_details(details);
            log_failure(required, &result);
            return result;
        }

        info!(url = %url, status, latency_ms = details.latency_ms, "endpoint ok");
        ProbeResult::success(status, details)
    }

    async fn fetch(&self, url: &str) -> Result<(u16, ResponseDetails), ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::from_transport(e, self.timeout))?;

        let status = response.status().as_u16();
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let content_type = header_str(header::CONTENT_TYPE);
        let server = header_str(header::SERVER);

        // Raw bytes: the size must not depend on how the body decodes.
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::from_transport(e, self.timeout))?;

        Ok((
            status,
            ResponseDetails {
                latency_ms: started.elapsed().as_millis() as u64,
                size_bytes: body.len(),
                content_type,
                server,
                preview: body_preview(&String::from_utf8_lossy(&body)),
            },
        ))
    }
}

fn log_failure(required: bool, result: &ProbeResult) {
    let error = result.error.as_deref().unwrap_or_default();
    if required {
        warn!(error, "required endpoint failed");
    } else {
        warn!(error, "non-critical endpoint failed");
    }
}
