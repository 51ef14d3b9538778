//! Target parsing and the domain resolution adapter.
//!
//! The scan engine only ever sees an `IpAddr`. Hostnames are resolved here,
//! once per scan, before any probe is dispatched.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A scan target that has been resolved to an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(original: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            original: original.into(),
            ip,
        }
    }

    /// Whether the target was given as a hostname rather than an IP literal.
    pub fn was_resolved(&self) -> bool {
        self.original != self.ip.to_string()
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.was_resolved() {
            write!(f, "{} ({})", self.original, self.ip)
        } else {
            write!(f, "{}", self.ip)
        }
    }
}

/// What the operator typed as the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A literal IPv4 or IPv6 address.
    Ip(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, ScanError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(ScanError::ResolutionFailed {
            target: s.to_string(),
            reason: "not an IP address or valid hostname".to_string(),
        })
    }

    /// Resolve to a single address.
    ///
    /// IP literals pass through untouched. Hostnames go through the system
    /// resolver configuration; IPv4 answers win over IPv6 ones.
    pub async fn resolve(&self) -> Result<ScanTarget, ScanError> {
        match self {
            Self::Ip(ip) => Ok(ScanTarget::new(ip.to_string(), *ip)),
            Self::Hostname(hostname) => {
                let ip = resolve_hostname(hostname).await?;
                tracing::debug!(%hostname, %ip, "resolved target");
                Ok(ScanTarget::new(hostname.clone(), ip))
            }
        }
    }
}

impl FromStr for TargetSpec {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

async fn resolve_hostname(hostname: &str) -> Result<IpAddr, ScanError> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "system resolver config unavailable, using defaults");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| ScanError::ResolutionFailed {
            target: hostname.to_string(),
            reason: e.to_string(),
        })?;

    pick_address(response.iter()).ok_or_else(|| ScanError::ResolutionFailed {
        target: hostname.to_string(),
        reason: "no addresses found".to_string(),
    })
}

/// First IPv4 address, else the first address of any family.
fn pick_address(addrs: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    let mut fallback = None;
    for ip in addrs {
        if ip.is_ipv4() {
            return Some(ip);
        }
        fallback.get_or_insert(ip);
    }
    fallback
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.trim_end_matches('.').split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.starts_with(|c: char| c.is_ascii_alphanumeric())
            && label.ends_with(|c: char| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
