// # ddsync-core
//
// Core library for the ddsync dynamic DNS client.
//
// ## Architecture Overview
//
// One sync attempt compares the network's public IPv4 address with the
// address currently published for a host name and, when they differ, pushes
// the new address to a dyndns2-style provider:
// - **PublicIpSource**: Trait for fetching the public IPv4 address
// - **HostLookup**: Trait for resolving the host's published A records
// - **UpdateClient**: Trait for sending the update request
// - **HostIpResolver**: Cache and failure tolerance around `HostLookup`
// - **SyncEngine**: Orchestrates one attempt over a shared `ResolvedState`
// - **SyncService**: Runs the engine periodically with an error budget
//
// ## Design Principles
//
// 1. **Single error channel**: Every public operation returns `Result<T>`
// 2. **Explicit state**: Configuration and run state are values, nothing is global
// 3. **Serialized attempts**: One attempt at a time per engine
// 4. **Library-First**: I/O lives behind traits, implemented in sibling crates

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod response;
pub mod service;
pub mod state;
pub mod template;
pub mod traits;

// Re-export core types for convenience
pub use traits::{HostLookup, PublicIpSource, UpdateClient};
pub use engine::{SyncEngine, SyncEvent, SyncOutcome, SyncPhase};
pub use service::SyncService;
pub use resolver::{HostIpResolver, HostResolution, ResolutionPolicy};
pub use config::{DaemonConfig, ServiceConfig, SyncConfig};
pub use error::{Error, Result};
pub use response::{ResponseCode, ResponseStatus, UpdateOutcome};
pub use state::ResolvedState;
pub use template::UpdateUrlTemplate;
