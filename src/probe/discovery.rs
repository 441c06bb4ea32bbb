//! Best-effort discovery of this host's private IPv4 addresses.
//!
//! Discovery is an ordered chain of [`Strategy`] values tried until one
//! produces at least one private address:
//!
//! 1. [`Strategy::Interfaces`]: enumerate network interfaces, skipping
//!    loopback-named ones, and keep private IPv4 addresses.
//! 2. [`Strategy::RoutingTable`]: `connect` a UDP socket toward a public
//!    address and read back the source address the routing table picked.
//!    `connect` on a datagram socket sends nothing.
//! 3. [`Strategy::Loopback`]: `127.0.0.1`, which always succeeds.
//!
//! "Private" here means 10/8, 172.16/12, 192.168/16 **and** 127/8. Loopback is
//! not RFC 1918 space, but this tool has always counted it as private and
//! target lists depend on that.

use std::{
    collections::HashSet,
    hash::Hash,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Public address used only to make the kernel choose a route.
const ROUTE_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Why a single discovery strategy produced nothing.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("interface enumeration failed: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("routing probe socket failed: {0}")]
    Socket(#[source] std::io::Error),

    #[error("no private IPv4 address found")]
    NoPrivateAddress,
}

/// One way of finding local addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Interfaces,
    RoutingTable,
    Loopback,
}

impl Strategy {
    /// The production chain, in the order it is tried.
    pub const DEFAULT_CHAIN: [Strategy; 3] =
        [Strategy::Interfaces, Strategy::RoutingTable, Strategy::Loopback];

    pub fn discover(self) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        match self {
            Self::Interfaces => {
                let interfaces = if_addrs::get_if_addrs().map_err(DiscoveryError::Enumerate)?;
                non_empty(private_interface_addrs(
                    interfaces.iter().map(|iface| (iface.name.as_str(), iface.ip())),
                ))
            }
            Self::RoutingTable => {
                let local = routed_source_addr().map_err(DiscoveryError::Socket)?;
                match local {
                    IpAddr::V4(v4) if is_private_v4(v4) => Ok(vec![v4]),
                    other => {
                        debug!(addr = %other, "routed source address is not private");
                        Err(DiscoveryError::NoPrivateAddress)
                    }
                }
            }
            Self::Loopback => Ok(vec![Ipv4Addr::LOCALHOST]),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Interfaces => "interfaces",
            Self::RoutingTable => "routing_table",
            Self::Loopback => "loopback",
        })
    }
}

/// Discover private addresses with the default strategy chain.
pub fn discover_private_ips() -> Vec<Ipv4Addr> {
    discover_with(Strategy::DEFAULT_CHAIN.iter().map(|s| (s.to_string(), s.discover())))
}

/// Take the first successful strategy result, de-duplicated.
///
/// Strategies are evaluated lazily, so later ones never run once an earlier
/// one succeeds. Falls back to loopback if every strategy fails.
pub fn discover_with<I>(attempts: I) -> Vec<Ipv4Addr>
where
    I: IntoIterator<Item = (String, Result<Vec<Ipv4Addr>, DiscoveryError>)>,
{
    for (name, attempt) in attempts {
        match attempt {
            Ok(addrs) if !addrs.is_empty() => {
                let addrs = dedup_preserving_order(addrs);
                info!(strategy = %name, count = addrs.len(), "discovered private addresses");
                return addrs;
            }
            Ok(_) => warn!(strategy = %name, "discovery strategy found no addresses"),
            Err(e) => warn!(strategy = %name, error = %e, "discovery strategy failed"),
        }
    }
    warn!("all discovery strategies failed, falling back to loopback");
    vec![Ipv4Addr::LOCALHOST]
}

/// Private IPv4 addresses from `(interface name, address)` pairs, skipping
/// loopback-named interfaces (`lo`, `lo0`, ...).
pub fn private_interface_addrs<'a, I>(interfaces: I) -> Vec<Ipv4Addr>
where
    I: IntoIterator<Item = (&'a str, IpAddr)>,
{
    interfaces
        .into_iter()
        .filter(|(name, _)| !name.starts_with("lo"))
        .filter_map(|(_, addr)| match addr {
            IpAddr::V4(v4) if is_private_v4(v4) => Some(v4),
            _ => None,
        })
        .collect()
}

/// Whether `addr` is a private IPv4 address (loopback included).
///
/// Anything that does not parse as dotted-quad IPv4 is "not private".
pub fn is_private(addr: &str) -> bool {
    addr.trim()
        .parse::<Ipv4Addr>()
        .map(is_private_v4)
        .unwrap_or(false)
}

pub fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback()
}

/// Remove repeats, keeping the first occurrence of each value in order.
pub fn dedup_preserving_order<T>(items: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn routed_source_addr() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}

fn non_empty(addrs: Vec<Ipv4Addr>) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
    if addrs.is_empty() {
        Err(DiscoveryError::NoPrivateAddress)
    } else {
        Ok(addrs)
    }
}
