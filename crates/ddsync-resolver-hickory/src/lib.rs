//! Host name lookup via [hickory-resolver](https://github.com/hickory-dns/hickory-dns)
//!
//! Queries the A records published for the dynamic host. The lookup asks
//! DNS directly instead of going through the platform resolver, so the
//! answer reflects what the provider is serving.

use ddsync_core::traits::HostLookup;
use ddsync_core::{Error, Result};

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};

use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// A record lookup backed by an async hickory resolver
pub struct HickoryHostLookup {
    resolver: TokioResolver,
}

impl HickoryHostLookup {
    /// Create a lookup using the system resolver configuration (`/etc/resolv.conf`)
    pub fn from_system_conf() -> Result<Self> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| Error::config(format!("Failed to read system DNS configuration: {}", e)))?
            .build();

        Ok(Self { resolver })
    }

    /// Create a lookup with explicit name servers and options
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self { resolver }
    }

    /// System configuration, falling back to hickory's default public servers
    pub fn system_or_default() -> Self {
        match Self::from_system_conf() {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!("{}; using default public name servers", e);
                Self::with_config(ResolverConfig::default(), ResolverOpts::default())
            }
        }
    }
}

fn lookup_error(hostname: &str, error: ResolveError) -> Error {
    Error::dns_resolution(hostname, error.to_string())
}

#[async_trait::async_trait]
impl HostLookup for HickoryHostLookup {
    async fn lookup_ipv4(&self, hostname: &str) -> Result<Vec<Ipv4Addr>> {
        let lookup = self
            .resolver
            .ipv4_lookup(hostname)
            .await
            .map_err(|e| lookup_error(hostname, e))?;

        let addresses: Vec<Ipv4Addr> = lookup.iter().map(|record| record.0).collect();
        debug!("A records for {}: {:?}", hostname, addresses);

        Ok(addresses)
    }
}

impl std::fmt::Debug for HickoryHostLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryHostLookup").finish_non_exhaustive()
    }
}
