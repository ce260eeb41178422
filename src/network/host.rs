use crate::error::{BlockchainError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::RwLock;

/// A peer's listening endpoint as advertised in welcome messages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub host: String,
    pub port: u16,
}

impl Host {
    pub fn new(host: &str, port: u16) -> Host {
        Host {
            host: host.to_string(),
            port,
        }
    }

    /// Parse `host:port`, splitting at the last colon so bare IPv6 hosts work.
    pub fn parse(address: &str) -> Result<Host> {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| BlockchainError::AddressFormat(address.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(BlockchainError::AddressFormat(address.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| BlockchainError::AddressFormat(address.to_string()))?;
        Ok(Host::new(host, port))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when this names our own listener on the local machine.
    pub fn is_local_listener(&self, listen_port: u16) -> bool {
        if self.port != listen_port {
            return false;
        }
        if self.host.eq_ignore_ascii_case("localhost") {
            return true;
        }
        match self.host.parse::<IpAddr>() {
            Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Hosts learned through handshakes. Grows monotonically, never holds the same
/// host and port twice.
pub struct KnownHosts {
    inner: RwLock<Vec<Host>>,
}

impl Default for KnownHosts {
    fn default() -> Self {
        Self::new()
    }
}

impl KnownHosts {
    pub fn new() -> KnownHosts {
        KnownHosts {
            inner: RwLock::new(vec![]),
        }
    }

    /// Returns true if the host was not known before. The check and the insert
    /// happen under one write lock.
    pub fn add_host(&self, host: Host) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|e| {
            BlockchainError::Network(format!("Failed to acquire known hosts lock: {e}"))
        })?;
        if inner.contains(&host) {
            return Ok(false);
        }
        info!("Added known host {host}");
        inner.push(host);
        Ok(true)
    }

    pub fn is_known(&self, host: &Host) -> Result<bool> {
        let inner = self.inner.read().map_err(|e| {
            BlockchainError::Network(format!("Failed to acquire known hosts lock: {e}"))
        })?;
        Ok(inner.contains(host))
    }

    pub fn get_hosts(&self) -> Result<Vec<Host>> {
        let inner = self.inner.read().map_err(|e| {
            BlockchainError::Network(format!("Failed to acquire known hosts lock: {e}"))
        })?;
        Ok(inner.clone())
    }

    pub fn len(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(|e| {
            BlockchainError::Network(format!("Failed to acquire known hosts lock: {e}"))
        })?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
