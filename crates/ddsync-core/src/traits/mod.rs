//! Core traits for the ddsync system
//!
//! This module defines the seams between the engine and its I/O.
//!
//! - [`PublicIpSource`]: Fetch the network's public IPv4 address
//! - [`HostLookup`]: Resolve the A records currently published for a host
//! - [`UpdateClient`]: Push a new address to the dynamic DNS provider

pub mod public_ip;
pub mod host_lookup;
pub mod update_client;

pub use public_ip::PublicIpSource;
pub use host_lookup::HostLookup;
pub use update_client::UpdateClient;
