//! Typed error taxonomy for the probe harness.
//!
//! Two families with very different propagation rules:
//!
//! - [`ConfigError`] is fatal. It aborts the run from `main` through an
//!   `anyhow` context chain before any request is issued.
//! - [`ProbeError`] is local to a single matrix entry. The prober catches it,
//!   records it in a [`ProbeResult`](crate::probe::ProbeResult), and lets the
//!   entry's `required` flag decide whether the run fails.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failure to load the probe configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure of a single probe request.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP {actual} (expected {expected})")]
    UnexpectedStatus { actual: u16, expected: u16 },

    #[error("unexpected error: {0}")]
    Request(String),
}

impl ProbeError {
    /// Classify a transport-level [`reqwest::Error`].
    ///
    /// Timeouts are checked before connect errors: a connect that times out
    /// reports both, and the timeout is the more useful diagnosis.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connection(error_chain(&err))
        } else {
            Self::Request(error_chain(&err))
        }
    }
}

/// Flatten an error and its sources into one line.
///
/// `reqwest` keeps the interesting part ("Connection refused") several levels
/// down the source chain; the top-level message alone is just "error sending
/// request".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
