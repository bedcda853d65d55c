//! Trusted-peer authorization for inbound notifications.
//!
//! A [`TrustedPeerRegistry`] is built once at startup from
//! [`TrustedPeerConfig`](crate::TrustedPeerConfig) and is immutable
//! afterwards. Handlers share it behind an `Arc` and ask a
//! [`TrustedPeerAuthorizer`] whether each remote address may submit
//! notifications.
//!
//! Membership is checked against the remote address string exactly as the
//! transport reported it. `127.0.0.1` and `::1`, or an IPv4 address and its
//! IPv4-mapped IPv6 form, are different entries.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::TrustedPeerConfig;
use crate::error::ResolutionFault;

/// Resolves a host name or address literal to a single address.
pub trait Resolver {
    /// Resolves `host`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionFault`] if `host` is unknown.
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolutionFault>;
}

/// Resolver backed by the platform's name service.
///
/// Address literals are parsed without a lookup. Otherwise the first address
/// returned by the system resolver is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolutionFault> {
        if let Ok(addr) = host.parse::<IpAddr>() {
            return Ok(addr);
        }
        let mut addrs = (host, 0u16)
            .to_socket_addrs()
            .map_err(|e| ResolutionFault::new(host, e.to_string()))?;
        addrs
            .next()
            .map(|sa| sa.ip())
            .ok_or_else(|| ResolutionFault::new(host, "no addresses returned"))
    }
}

/// Resolver over a fixed host table.
///
/// Address literals parse as themselves; every other host must be in the
/// table.
///
/// ```
/// use repository_guard::{Resolver, StaticResolver};
///
/// let resolver = StaticResolver::new().with_host("example.org", "203.0.113.5".parse().unwrap());
/// assert_eq!(resolver.resolve("example.org").unwrap().to_string(), "203.0.113.5");
/// assert!(resolver.resolve("bad.invalid").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, IpAddr>,
}

impl StaticResolver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host entry.
    pub fn with_host(mut self, host: impl Into<String>, addr: IpAddr) -> Self {
        self.hosts.insert(host.into(), addr);
        self
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolutionFault> {
        if let Ok(addr) = host.parse::<IpAddr>() {
            return Ok(addr);
        }
        self.hosts
            .get(host)
            .copied()
            .ok_or_else(|| ResolutionFault::new(host, "unknown host"))
    }
}

/// Immutable set of trusted peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPeerRegistry {
    trust_loopback: bool,
    trusted: HashSet<String>,
}

/// Outcome of building a registry.
///
/// Hostnames that failed to resolve are reported in `failures` and
/// contribute no trust entry.
#[derive(Debug)]
pub struct RegistryBuild {
    /// The registry, containing every entry that could be established
    pub registry: TrustedPeerRegistry,
    /// One fault per configured hostname that did not resolve
    pub failures: Vec<ResolutionFault>,
}

impl TrustedPeerRegistry {
    /// Builds a registry from configuration, resolving hostnames once.
    ///
    /// A hostname that fails to resolve is logged, recorded in
    /// [`RegistryBuild::failures`], and skipped; it never aborts the build.
    ///
    /// # Examples
    ///
    /// ```
    /// use repository_guard::{StaticResolver, TrustedPeerConfig, TrustedPeerRegistry};
    ///
    /// let config = TrustedPeerConfig {
    ///     localhost_default: false,
    ///     from_ip: "198.51.100.9".to_string(),
    ///     from_hostname: "example.org,bad.invalid".to_string(),
    /// };
    /// let resolver = StaticResolver::new().with_host("example.org", "203.0.113.5".parse().unwrap());
    ///
    /// let build = TrustedPeerRegistry::build(&config, &resolver);
    /// assert!(build.registry.contains("203.0.113.5"));
    /// assert!(build.registry.contains("198.51.100.9"));
    /// assert_eq!(build.failures.len(), 1);
    /// ```
    pub fn build<R: Resolver + ?Sized>(config: &TrustedPeerConfig, resolver: &R) -> RegistryBuild {
        let mut trusted: HashSet<String> = split_entries(&config.from_ip)
            .map(str::to_string)
            .collect();
        let mut failures = Vec::new();

        for hostname in split_entries(&config.from_hostname) {
            match resolver.resolve(hostname) {
                Ok(addr) => {
                    debug!(hostname, addr = %addr, "trusted hostname resolved");
                    trusted.insert(addr.to_string());
                }
                Err(fault) => {
                    error!(hostname, reason = %fault.reason, "trusted hostname is unknown, entry dropped");
                    failures.push(fault);
                }
            }
        }

        info!(
            trust_loopback = config.localhost_default,
            entries = trusted.len(),
            dropped = failures.len(),
            "trusted peer registry built"
        );

        RegistryBuild {
            registry: Self {
                trust_loopback: config.localhost_default,
                trusted,
            },
            failures,
        }
    }

    /// Whether loopback requests are trusted without being listed.
    pub fn trusts_loopback(&self) -> bool {
        self.trust_loopback
    }

    /// Whether `addr` is literally present in the trusted set.
    pub fn contains(&self, addr: &str) -> bool {
        self.trusted.contains(addr)
    }

    /// Number of distinct trusted entries.
    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    /// True if no peer is listed.
    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

/// Splits a comma-separated setting, trimming entries and skipping blanks.
fn split_entries(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|e| !e.is_empty())
}

/// Why a peer check succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerDecision {
    /// The remote address resolved to a loopback address and loopback is trusted
    TrustedLoopback,
    /// The remote address is literally listed
    TrustedListed,
    /// Neither
    Denied,
}

/// Result of a single peer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCheck {
    /// The decision
    pub decision: PeerDecision,
    /// Set when the remote address could not be resolved for the loopback
    /// test and the check fell back to literal membership
    pub fallback: Option<ResolutionFault>,
}

impl PeerCheck {
    /// True if the peer may submit notifications.
    pub fn is_trusted(&self) -> bool {
        self.decision != PeerDecision::Denied
    }
}

/// Decides whether inbound requests come from a trusted peer.
///
/// Holds no mutable state: identical inputs always produce identical
/// results, and it can be shared across request threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use repository_guard::{StaticResolver, TrustedPeerAuthorizer, TrustedPeerConfig, TrustedPeerRegistry};
///
/// let config = TrustedPeerConfig {
///     localhost_default: true,
///     ..TrustedPeerConfig::default()
/// };
/// let build = TrustedPeerRegistry::build(&config, &StaticResolver::new());
/// let authorizer = TrustedPeerAuthorizer::new(Arc::new(build.registry), StaticResolver::new());
///
/// assert!(authorizer.is_authorized("127.0.0.1"));
/// assert!(!authorizer.is_authorized("203.0.113.5"));
/// ```
#[derive(Debug, Clone)]
pub struct TrustedPeerAuthorizer<R = SystemResolver> {
    registry: Arc<TrustedPeerRegistry>,
    resolver: R,
}

impl<R: Resolver> TrustedPeerAuthorizer<R> {
    /// Creates an authorizer over a shared registry.
    pub fn new(registry: Arc<TrustedPeerRegistry>, resolver: R) -> Self {
        Self { registry, resolver }
    }

    /// The registry this authorizer consults.
    pub fn registry(&self) -> &TrustedPeerRegistry {
        &self.registry
    }

    /// Checks `remote_addr` and explains the outcome.
    ///
    /// With loopback trust enabled, the address is resolved first; a loopback
    /// address (including an IPv4-mapped one) is trusted. If resolution fails
    /// the fault is logged, recorded in [`PeerCheck::fallback`], and the check
    /// continues with literal membership.
    pub fn check(&self, remote_addr: &str) -> PeerCheck {
        let mut fallback = None;

        if self.registry.trust_loopback {
            match self.resolver.resolve(remote_addr) {
                Ok(addr) if is_loopback(addr) => {
                    debug!(remote_addr, "loopback peer trusted");
                    return PeerCheck {
                        decision: PeerDecision::TrustedLoopback,
                        fallback: None,
                    };
                }
                Ok(_) => {}
                Err(fault) => {
                    error!(remote_addr, reason = %fault.reason, "remote address could not be resolved");
                    fallback = Some(fault);
                }
            }
        }

        let decision = if self.registry.contains(remote_addr) {
            PeerDecision::TrustedListed
        } else {
            PeerDecision::Denied
        };
        debug!(remote_addr, ?decision, "peer checked");

        PeerCheck { decision, fallback }
    }

    /// Returns `true` if `remote_addr` is a trusted peer.
    pub fn is_authorized(&self, remote_addr: &str) -> bool {
        self.check(remote_addr).is_trusted()
    }
}

fn is_loopback(addr: IpAddr) -> bool {
    addr.to_canonical().is_loopback()
}
