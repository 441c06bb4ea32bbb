//! Test matrix construction: target addresses × endpoints.

use std::net::Ipv4Addr;

use tracing::info;

use super::{
    config::{ConnectionConfig, EndpointSpec, ProbeConfig},
    discovery::dedup_preserving_order,
};

/// One concrete (address, port, endpoint) combination to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMatrixEntry {
    pub ip_address: String,
    pub port: u16,
    pub endpoint: EndpointSpec,
    pub connection: ConnectionConfig,
}

impl TestMatrixEntry {
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.ip_address, self.port, self.endpoint.path)
    }

    /// Stable identifier, e.g. `10_0_0_5___api_v1_health` or `127_0_0_1__root`.
    pub fn id(&self) -> String {
        let ip = self.ip_address.replace('.', "_");
        let path = self.endpoint.path.replace(['/', '-'], "_");
        let path = if path == "_" { "root".to_string() } else { path };
        format!("{ip}__{path}")
    }
}

/// Where the target list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Configured,
    Discovered,
}

impl std::fmt::Display for TargetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Configured => "configured",
            Self::Discovered => "auto-detected",
        })
    }
}

/// Resolve the addresses to test.
///
/// Configured addresses win outright; `discover` is only called when the
/// config lists none. Both sources are de-duplicated in first-seen order.
pub fn resolve_targets<F>(config: &ProbeConfig, discover: F) -> (Vec<String>, TargetSource)
where
    F: FnOnce() -> Vec<Ipv4Addr>,
{
    if !config.ip_addresses.is_empty() {
        let ips = dedup_preserving_order(config.ip_addresses.iter().cloned());
        info!(ips = ?ips, "using configured IP addresses");
        return (ips, TargetSource::Configured);
    }

    let ips = dedup_preserving_order(discover().into_iter().map(|ip| ip.to_string()));
    info!(ips = ?ips, "auto-detected private IP addresses");
    (ips, TargetSource::Discovered)
}

/// Cross product of `ips` and `endpoints`: addresses outer, endpoints inner,
/// both in input order.
pub fn build(
    ips: &[String],
    port: u16,
    endpoints: &[EndpointSpec],
    connection: &ConnectionConfig,
) -> Vec<TestMatrixEntry> {
    ips.iter()
        .flat_map(|ip| {
            endpoints.iter().map(move |endpoint| TestMatrixEntry {
                ip_address: ip.clone(),
                port,
                endpoint: endpoint.clone(),
                connection: connection.clone(),
            })
        })
        .collect()
}
