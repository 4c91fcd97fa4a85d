// # Host Lookup Trait
//
// Defines the interface for resolving the addresses currently published for
// a host name. Caching and failure tolerance are not part of this trait; they
// live in `HostIpResolver`, which wraps a `HostLookup`.
//
// ## Implementations
//
// - hickory-dns A-record lookup: `ddsync-resolver-hickory` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for DNS A-record lookups
///
/// Implementations perform exactly one lookup per call and return the
/// answer in the order the resolver produced it. An empty answer may be
/// returned as `Ok(vec![])`; the caller treats it as a failed lookup.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Look up the IPv4 addresses for `hostname`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Ipv4Addr>)`: The A records, resolver order preserved
    /// - `Err(Error)`: If the lookup failed
    async fn lookup_ipv4(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, crate::Error>;
}
