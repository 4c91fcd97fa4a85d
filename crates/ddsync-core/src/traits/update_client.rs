// # Update Client Trait
//
// Defines the interface for publishing a new address through a dynamic DNS
// provider's HTTP API.
//
// ## Implementations
//
// - dyndns2 protocol (Google Domains, No-IP, DynDNS, ...): `ddsync-provider-dyndns2` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::response::UpdateOutcome;

/// Trait for dynamic DNS update clients
///
/// The client knows the host name and credentials it was built with; the
/// engine only hands it the address to publish.
///
/// # Contract
///
/// - Exactly one update request per call, no retry
/// - Transport failures and non-200 statuses are errors
/// - A 200 response is always classified and returned as `Ok`, including
///   provider tokens with `error` status; the caller decides what is fatal
/// - The client does not touch engine state (cache invalidation after a
///   successful update is done by the engine)
#[async_trait]
pub trait UpdateClient: Send + Sync {
    /// Publish `ip` for the configured host name
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: The classified provider response
    /// - `Err(Error::Network)`: If the request failed or the status was not 200
    async fn update(&self, ip: Ipv4Addr) -> Result<UpdateOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
