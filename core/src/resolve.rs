//! Localhost resolution override.
//!
//! Tests that intercept traffic for `www.example.test` still need that name
//! to resolve somewhere harmless if anything does dial it. Rather than
//! patching the process-wide resolver, the registry here is an explicit
//! value: inject it into whatever performs address resolution, consult
//! [`is_localhost`] first, and drop or clear it to revert.
//!
//! [`is_localhost`]: LocalhostResolver::is_localhost

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Which loopback address a lookup should yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn loopback(self) -> IpAddr {
        match self {
            AddressFamily::V4 => IpAddr::V4(Ipv4Addr::LOCALHOST),
            AddressFamily::V6 => IpAddr::V6(Ipv6Addr::LOCALHOST),
        }
    }
}

/// Registry of host names that must resolve to loopback.
#[derive(Debug, Clone, Default)]
pub struct LocalhostResolver {
    hosts: HashSet<String>,
}

impl LocalhostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, host: impl Into<String>) -> &mut Self {
        let host: String = host.into();
        self.hosts.insert(host.to_ascii_lowercase());
        self
    }

    pub fn unregister(&mut self, host: &str) -> bool {
        self.hosts.remove(&host.to_ascii_lowercase())
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    pub fn is_localhost(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    /// Loopback for registered names; `None` means "resolve for real".
    pub fn resolve(&self, host: &str, family: AddressFamily) -> Option<IpAddr> {
        self.is_localhost(host).then(|| family.loopback())
    }
}
