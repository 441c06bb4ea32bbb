//! Probe outcomes and the per-run report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ProbeError;

/// Preview length, in characters, of response bodies in logs.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success,
    /// An optional endpoint failed. Recorded, but the run still passes.
    NonCriticalFailure,
    /// A required endpoint failed. The run fails.
    RequiredFailure,
}

/// Diagnostics captured when a response arrived.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResponseDetails {
    pub latency_ms: u64,
    pub size_bytes: usize,
    pub content_type: Option<String>,
    pub server: Option<String>,
    pub preview: String,
}

/// Result of probing one matrix entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    pub status: Option<u16>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ResponseDetails>,
}

impl ProbeResult {
    pub fn success(status: u16, details: ResponseDetails) -> Self {
        Self {
            outcome: ProbeOutcome::Success,
            status: Some(status),
            error: None,
            details: Some(details),
        }
    }

    /// A failed probe, classified by whether the endpoint is required.
    ///
    /// `location` names the path and `ip:port` so the message stands alone in
    /// logs, e.g. `HTTP 500 (expected 200) for /health on 10.0.0.5:8080`.
    pub fn failure(required: bool, status: Option<u16>, err: &ProbeError, location: &str) -> Self {
        Self {
            outcome: if required {
                ProbeOutcome::RequiredFailure
            } else {
                ProbeOutcome::NonCriticalFailure
            },
            status,
            error: Some(format!("{err} for {location}")),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ResponseDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// One line of the run report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub id: String,
    pub url: String,
    pub result: ProbeResult,
}

/// Everything recorded during one probe run, in matrix order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, id: String, url: String, result: ProbeResult) {
        self.entries.push(ReportEntry { id, url, result });
    }

    pub fn count(&self, outcome: ProbeOutcome) -> usize {
        self.entries.iter().filter(|e| e.result.outcome == outcome).count()
    }

    /// True when no required endpoint failed.
    pub fn passed(&self) -> bool {
        self.count(ProbeOutcome::RequiredFailure) == 0
    }

    pub fn required_failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.result.outcome == ProbeOutcome::RequiredFailure)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-line preview of a response body, truncated to 100 characters.
pub fn body_preview(body: &str) -> String {
    let mut preview: String = body
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if body.chars().nth(PREVIEW_CHARS).is_some() {
        preview.push_str("...");
    }
    preview
}
