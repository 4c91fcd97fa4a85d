// # Resolved State
//
// Mutable run state carried from one sync attempt to the next.
//
// ## Ownership
//
// A `ResolvedState` belongs to exactly one `SyncEngine`. The engine keeps it
// behind an async mutex that is held for the whole attempt, so attempts never
// interleave their reads and writes. Callers only ever see snapshots.
//
// ## Lifecycle
//
// - Created with the engine, `current_ip` starts at the `0.0.0.0` sentinel
// - Host resolution fills `current_ip` and stamps `last_resolved_at`
// - A successful update clears `last_resolved_at` so the next attempt
//   resolves the freshly published record instead of trusting the cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Placeholder host address used until a resolution succeeds
pub const UNRESOLVED_SENTINEL: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Run state shared between sync attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedState {
    /// Last fetched public address
    pub public_ip: Option<Ipv4Addr>,

    /// Last resolved (or cached) host address, the sentinel until resolved
    pub current_ip: Ipv4Addr,

    /// When the host name was last resolved successfully
    pub last_resolved_at: Option<DateTime<Utc>>,

    /// Consecutive failed host name lookups
    pub unresolved_host_name_error_count: u32,
}

impl ResolvedState {
    /// Fresh state: nothing fetched, nothing resolved
    pub fn new() -> Self {
        Self {
            public_ip: None,
            current_ip: UNRESOLVED_SENTINEL,
            last_resolved_at: None,
            unresolved_host_name_error_count: 0,
        }
    }

    /// Seed the state with a previously resolved host address
    pub fn with_resolved(current_ip: Ipv4Addr, resolved_at: DateTime<Utc>) -> Self {
        Self {
            current_ip,
            last_resolved_at: Some(resolved_at),
            ..Self::new()
        }
    }

    /// Whether the cached host address is still inside its lifetime
    ///
    /// A timestamp in the future (clock moved backwards) counts as stale.
    pub fn is_cache_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let Some(resolved_at) = self.last_resolved_at else {
            return false;
        };

        match now.signed_duration_since(resolved_at).to_std() {
            Ok(elapsed) => elapsed < max_age,
            Err(_) => false,
        }
    }

    /// Record a successful host name resolution
    pub fn record_resolution(&mut self, ip: Ipv4Addr, at: DateTime<Utc>) {
        self.current_ip = ip;
        self.last_resolved_at = Some(at);
        self.unresolved_host_name_error_count = 0;
    }

    /// Record a failed host name resolution, returning the new failure count
    pub fn record_resolution_failure(&mut self) -> u32 {
        self.unresolved_host_name_error_count = self.unresolved_host_name_error_count.saturating_add(1);
        self.unresolved_host_name_error_count
    }

    /// Force the next attempt to resolve the host name again
    pub fn invalidate_cache(&mut self) {
        self.last_resolved_at = None;
    }
}

impl Default for ResolvedState {
    fn default() -> Self {
        Self::new()
    }
}
