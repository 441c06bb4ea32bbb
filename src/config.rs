//! Configuration for the stub HTTP service.
//!
//! Config is built once at startup: built-in defaults, optionally replaced by
//! a TOML file named in `STUB_CONFIG`, then overridden by the `PORT` and
//! `APP_VERSION` environment variables. The resulting value is immutable and
//! shared with handlers through [`crate::api::AppState`].
//!
//! # Example
//! ```toml
//! [service]
//! name        = "test-api"
//! version     = "1.0.0"
//! environment = "staging"
//! port        = 8080
//!
//! [logging]
//! level  = "info"
//! format = "json"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Top-level stub service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Build the startup config from the process environment.
    ///
    /// `STUB_CONFIG` names an optional TOML file; `PORT` and `APP_VERSION`
    /// override the corresponding fields afterwards.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = match std::env::var("STUB_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))
                .with_context(|| format!("Failed to load config from {path}"))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(std::env::var("PORT").ok(), std::env::var("APP_VERSION").ok())?;
        Ok(config)
    }

    /// Apply the `PORT` / `APP_VERSION` overrides. Empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        port: Option<String>,
        version: Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.service.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got `{port}`"))?;
        }
        if let Some(version) = version.filter(|v| !v.trim().is_empty()) {
            self.service.version = version.trim().to_string();
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.service.name.trim().is_empty(), "[service] name must not be empty");
        anyhow::ensure!(
            !self.service.version.trim().is_empty(),
            "[service] version must not be empty"
        );
        anyhow::ensure!(
            self.service.host.parse::<std::net::IpAddr>().is_ok(),
            "[service] host `{}` is not an IP address",
            self.service.host
        );
        Ok(())
    }

    /// Socket address the service binds to.
    pub fn bind_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        let ip: std::net::IpAddr = self
            .service
            .host
            .parse()
            .with_context(|| format!("invalid host `{}`", self.service.host))?;
        Ok(std::net::SocketAddr::new(ip, self.service.port))
    }
}

/// Identity and listener settings reported by the stub routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name reported by `/health`, `/status` and friends (default: `test-api`).
    #[serde(default = "defaults::name")]
    pub name: String,

    /// Version string (default: `1.0.0`, overridden by `APP_VERSION`).
    #[serde(default = "defaults::version")]
    pub version: String,

    #[serde(default = "defaults::description")]
    pub description: String,

    /// Free-form deployment label echoed by `/config`.
    #[serde(default = "defaults::environment")]
    pub environment: String,

    /// Listen address (default: `0.0.0.0`).
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Listen port (default: 8080, overridden by `PORT`).
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: defaults::name(),
            version: defaults::version(),
            description: defaults::description(),
            environment: defaults::environment(),
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Level for this crate when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "defaults::log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            format: LogFormat::default(),
        }
    }
}

mod defaults {
    pub fn name() -> String { "test-api".into() }
    pub fn version() -> String { "1.0.0".into() }
    pub fn description() -> String { "Simple API for testing HTTP endpoints".into() }
    pub fn environment() -> String { "development".into() }
    pub fn host() -> String { "0.0.0.0".into() }
    pub fn port() -> u16 { 8080 }
    pub fn log_level() -> String { "info".into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Parsing & validation
    // -----------------------------------------------------------------------

    #[test]
    fn parse_example_config() {
        let content = include_str!("../service.example.toml");
        let config: Config = toml::from_str(content).expect("example config should parse");
        config.validate().expect("example config should be valid");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").expect("empty config should parse");
        assert_eq!(config.service.name, "test-api");
        assert_eq!(config.service.version, "1.0.0");
        assert_eq!(config.service.host, "0.0.0.0");
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn partial_service_section_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [service]
            port = 9000
            [logging]
            format = "json"
            "#,
        )
        .expect("should parse");
        assert_eq!(config.service.port, 9000);
        assert_eq!(config.service.name, "test-api");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn validation_rejects_non_ip_host() {
        let mut config = Config::default();
        config.service.host = "not an address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_empty_name() {
        let mut config = Config::default();
        config.service.name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join(format!("stub-{}.toml", uuid::Uuid::new_v4()));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("reading"), "{err}");
    }

    // -----------------------------------------------------------------------
    // Environment overrides
    // -----------------------------------------------------------------------

    #[test]
    fn overrides_replace_port_and_version() {
        let mut config = Config::default();
        config
            .apply_overrides(Some("9090".into()), Some("2.3.4".into()))
            .expect("valid overrides");
        assert_eq!(config.service.port, 9090);
        assert_eq!(config.service.version, "2.3.4");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(Some(String::new()), Some("  ".into()))
            .expect("empty overrides are not errors");
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.version, "1.0.0");
    }

    #[test]
    fn unparsable_port_is_an_error() {
        let mut config = Config::default();
        let err = config.apply_overrides(Some("eighty".into()), None).unwrap_err();
        assert!(err.to_string().contains("eighty"), "{err}");
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let mut config = Config::default();
        config.service.host = "127.0.0.1".into();
        config.service.port = 3000;
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn log_format_displays_snake_case() {
        assert_eq!(LogFormat::Text.to_string(), "text");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
