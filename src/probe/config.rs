//! The probe matrix configuration, loaded from YAML.
//!
//! ```yaml
//! ip_addresses: []          # empty or absent: auto-detect private IPs
//! default_port: 8080
//! endpoints:
//!   - path: /health
//!     description: Health check
//!     expected_status: 200  # default 200
//!     required: true        # default true
//! connection_config:
//!   timeout: 5
//!   allow_redirects: true
//!   max_redirects: 3
//!   headers:
//!     User-Agent: endpoint-probe
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "http_endpoint_config.yml";

/// Top-level probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Explicit targets. When empty, private addresses are discovered instead.
    #[serde(default)]
    pub ip_addresses: Vec<String>,

    #[serde(default = "defaults::port")]
    pub default_port: u16,

    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,

    #[serde(default)]
    pub connection_config: ConnectionConfig,
}

impl ProbeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Pick the config path: CLI argument, then `PROBE_CONFIG`, then
    /// [`DEFAULT_CONFIG_FILE`] in the working directory.
    pub fn resolve_path(arg: Option<String>) -> PathBuf {
        arg.or_else(|| std::env::var("PROBE_CONFIG").ok())
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_config.timeout == 0 {
            return Err(ConfigError::Invalid(
                "connection_config.timeout must be at least 1 second".into(),
            ));
        }

        for endpoint in &self.endpoints {
            if !endpoint.path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "endpoint path `{}` must start with `/`",
                    endpoint.path
                )));
            }
            if !(100..=999).contains(&endpoint.expected_status) {
                return Err(ConfigError::Invalid(format!(
                    "endpoint `{}` expected_status {} is not an HTTP status code",
                    endpoint.path, endpoint.expected_status
                )));
            }
        }

        for (name, value) in &self.connection_config.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::Invalid(format!("invalid header name `{name}`")));
            }
            if HeaderValue::from_str(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "invalid value for header `{name}`"
                )));
            }
        }

        Ok(())
    }
}

/// One endpoint to probe on every target address.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Request path, including the leading `/`.
    pub path: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "defaults::expected_status")]
    pub expected_status: u16,

    /// A failing required endpoint fails the whole run.
    #[serde(default = "defaults::required")]
    pub required: bool,
}

/// Per-request client settings shared by every matrix entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Request timeout in seconds (default: 5).
    #[serde(default = "defaults::timeout")]
    pub timeout: u64,

    #[serde(default = "defaults::allow_redirects")]
    pub allow_redirects: bool,

    /// Ignored when `allow_redirects` is false.
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,

    /// Extra request headers. Ordered so summaries are stable.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: defaults::timeout(),
            allow_redirects: defaults::allow_redirects(),
            max_redirects: defaults::max_redirects(),
            headers: BTreeMap::new(),
        }
    }
}

mod defaults {
    pub fn port() -> u16 { 8080 }
    pub fn expected_status() -> u16 { 200 }
    pub fn required() -> bool { true }
    pub fn timeout() -> u64 { 5 }
    pub fn allow_redirects() -> bool { true }
    pub fn max_redirects() -> usize { 3 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("probe-{}.yml", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).expect("write temp config");
        path
    }

    // -----------------------------------------------------------------------
    // Parsing & defaults
    // -----------------------------------------------------------------------

    #[test]
    fn parse_bundled_config() {
        let content = include_str!("../../http_endpoint_config.yml");
        let config: ProbeConfig = serde_yaml::from_str(content).expect("bundled config should parse");
        config.validate().expect("bundled config should be valid");
        assert!(config.ip_addresses.is_empty());
        assert!(!config.endpoints.is_empty());
    }

    #[test]
    fn defaults_are_applied_to_minimal_config() {
        let config: ProbeConfig = serde_yaml::from_str(
            r#"
            endpoints:
              - path: /health
            "#,
        )
        .expect("should parse");

        assert!(config.ip_addresses.is_empty());
        assert_eq!(config.default_port, 8080);
        assert_eq!(config.endpoints[0].expected_status, 200);
        assert!(config.endpoints[0].required);
        assert_eq!(config.endpoints[0].description, "");
        assert_eq!(config.connection_config, ConnectionConfig::default());
        assert_eq!(config.connection_config.timeout(), Duration::from_secs(5));
        assert!(config.connection_config.allow_redirects);
        assert_eq!(config.connection_config.max_redirects, 3);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: ProbeConfig = serde_yaml::from_str(
            r#"
            ip_addresses: ["10.0.0.5", "10.0.0.6"]
            default_port: 9000
            endpoints:
              - path: /metrics
                description: Metrics
                expected_status: 204
                required: false
            connection_config:
              timeout: 2
              allow_redirects: false
              max_redirects: 0
              headers:
                X-Probe: "yes"
            "#,
        )
        .expect("should parse");

        assert_eq!(config.ip_addresses, vec!["10.0.0.5", "10.0.0.6"]);
        assert_eq!(config.default_port, 9000);
        assert_eq!(config.endpoints[0].expected_status, 204);
        assert!(!config.endpoints[0].required);
        assert!(!config.connection_config.allow_redirects);
        assert_eq!(config.connection_config.headers["X-Probe"], "yes");
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    #[test]
    fn load_missing_file_is_not_found() {
        let path = std::env::temp_dir().join(format!("absent-{}.yml", uuid::Uuid::new_v4()));
        let err = ProbeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn load_malformed_yaml_is_parse_error() {
        let path = write_temp("endpoints: [ {path: /health");
        let err = ProbeConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn load_valid_file() {
        let path = write_temp("ip_addresses: [192.168.1.5]\nendpoints:\n  - path: /health\n");
        let config = ProbeConfig::load(&path).expect("valid config");
        std::fs::remove_file(&path).ok();
        assert_eq!(config.ip_addresses, vec!["192.168.1.5"]);
        assert_eq!(config.endpoints.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn validation_rejects_relative_path() {
        let config: ProbeConfig =
            serde_yaml::from_str("endpoints:\n  - path: health\n").expect("should parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validation_rejects_out_of_range_status() {
        let config: ProbeConfig = serde_yaml::from_str(
            "endpoints:\n  - path: /health\n    expected_status: 42\n",
        )
        .expect("should parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validation_rejects_zero_timeout() {
        let path = write_temp("endpoints:\n  - path: /health\nconnection_config:\n  timeout: 0\n");
        let err = ProbeConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("timeout")), "{err:?}");
    }

    #[test]
    fn validation_rejects_bad_header_name() {
        let config: ProbeConfig = serde_yaml::from_str(
            "connection_config:\n  headers:\n    \"bad header\": x\n",
        )
        .expect("should parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    // -----------------------------------------------------------------------
    // Path resolution
    // -----------------------------------------------------------------------

    #[test]
    fn cli_argument_wins_path_resolution() {
        let path = ProbeConfig::resolve_path(Some("custom.yml".into()));
        assert_eq!(path, PathBuf::from("custom.yml"));
    }
}
