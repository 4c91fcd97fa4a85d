//! Host address resolution with caching and failure tolerance
//!
//! [`HostIpResolver`] answers "what address is published for our host name
//! right now?" on behalf of the engine. It wraps a [`HostLookup`] and applies
//! the policy, in order:
//!
//! 1. Cache enabled and fresh → return the cached address, no I/O
//! 2. Look up the A records and take the first answer
//! 3. On failure, count it; escalate when fail-fast is set or the count
//!    reaches the limit, otherwise fall back to the previous address (or the
//!    `0.0.0.0` sentinel). The fallback makes the engine lean towards
//!    sending an update rather than silently doing nothing.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::state::ResolvedState;
use crate::traits::HostLookup;
use chrono::Utc;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache and failure tolerance settings for host resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionPolicy {
    /// Escalate the first failed lookup
    pub fail_on_unresolved: bool,
    /// Consecutive failed lookups that escalate
    pub max_unresolved: u32,
    /// Reuse the last resolved address while fresh
    pub use_cache: bool,
    /// Lifetime of a resolved address
    pub cache_expires: Duration,
}

impl ResolutionPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            fail_on_unresolved: config.fail_on_unresolved_host_name,
            max_unresolved: config.max_unresolved_host_name_fail,
            use_cache: config.use_host_ip_address_cache,
            cache_expires: config.cache_expires(),
        }
    }
}

/// How the host address for an attempt was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResolution {
    /// Served from the cache without a lookup
    Cached(Ipv4Addr),

    /// Freshly resolved
    Resolved(Ipv4Addr),

    /// Lookup failed but stayed under the tolerance limit
    Tolerated {
        /// The previous address, or the sentinel
        ip: Ipv4Addr,
        /// Consecutive failures so far
        failures: u32,
        /// Why the lookup failed
        reason: String,
    },
}

impl HostResolution {
    /// The address to compare against
    pub fn ip(&self) -> Ipv4Addr {
        match self {
            HostResolution::Cached(ip) | HostResolution::Resolved(ip) => *ip,
            HostResolution::Tolerated { ip, .. } => *ip,
        }
    }
}

/// Cache-aware, failure-tolerant host address resolver
pub struct HostIpResolver {
    hostname: String,
    lookup: Box<dyn HostLookup>,
    policy: ResolutionPolicy,
}

impl HostIpResolver {
    /// Create a new resolver
    ///
    /// # Parameters
    ///
    /// - `hostname`: The host name to resolve
    /// - `lookup`: DNS lookup implementation
    /// - `policy`: Cache and tolerance settings
    pub fn new(hostname: impl Into<String>, lookup: Box<dyn HostLookup>, policy: ResolutionPolicy) -> Self {
        Self {
            hostname: hostname.into(),
            lookup,
            policy,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Resolve the host address, updating `state`
    ///
    /// # Returns
    ///
    /// - `Ok(HostResolution)`: The address and how it was obtained
    /// - `Err(Error::DnsResolution)`: The failure was escalated by the policy
    pub async fn resolve(&self, state: &mut ResolvedState) -> Result<HostResolution> {
        if self.policy.use_cache && state.is_cache_fresh(self.policy.cache_expires, Utc::now()) {
            return Ok(HostResolution::Cached(state.current_ip));
        }

        match self.lookup_first().await {
            Ok(ip) => {
                state.record_resolution(ip, Utc::now());
                debug!("Resolved {} to {}", self.hostname, ip);
                Ok(HostResolution::Resolved(ip))
            }
            Err(reason) => {
                let failures = state.record_resolution_failure();

                if self.policy.fail_on_unresolved || failures >= self.policy.max_unresolved {
                    return Err(Error::dns_resolution(&self.hostname, reason));
                }

                warn!(
                    "Unable to resolve {} ({} of {} tolerated failures): {}",
                    self.hostname, failures, self.policy.max_unresolved, reason
                );
                Ok(HostResolution::Tolerated {
                    ip: state.current_ip,
                    failures,
                    reason,
                })
            }
        }
    }

    async fn lookup_first(&self) -> std::result::Result<Ipv4Addr, String> {
        let addresses = self
            .lookup
            .lookup_ipv4(&self.hostname)
            .await
            .map_err(|e| match e {
                Error::DnsResolution { message, .. } => message,
                other => other.to_string(),
            })?;

        addresses
            .first()
            .copied()
            .ok_or_else(|| "No addresses returned".to_string())
    }
}

impl std::fmt::Debug for HostIpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostIpResolver")
            .field("hostname", &self.hostname)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
