// # Public IP Source Trait
//
// Defines the interface for discovering the address the outside world sees.
//
// ## Implementations
//
// - HTTP "what is my IP" endpoint: `ddsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddsync_core::PublicIpSource;
//
// #[tokio::main]
// async fn main() -> ddsync_core::Result<()> {
//     let source = /* PublicIpSource implementation */;
//
//     let ip = source.fetch().await?;
//     println!("Public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP source implementations
///
/// # Contract
///
/// - One fetch per call, no retry and no backoff (retry cadence belongs to
///   the caller that schedules sync attempts)
/// - No caching between calls
/// - The returned address has already been normalized and strictly parsed
///
/// # Errors
///
/// - [`Error::Network`](crate::Error::Network): transport failure or a non-200 status
/// - [`Error::InvalidResponse`](crate::Error::InvalidResponse): the body is not an IPv4 address
#[async_trait]
pub trait PublicIpSource: Send + Sync {
    /// Fetch the current public IPv4 address
    async fn fetch(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short description for logs (e.g. the endpoint URL)
    fn describe(&self) -> String;
}
