//! Core synchronization engine
//!
//! The SyncEngine is responsible for:
//! - Fetching the public IP via PublicIpSource
//! - Resolving the published host IP via HostIpResolver (cache-aware)
//! - Comparing the two and deciding whether to update
//! - Publishing the new IP via UpdateClient
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ PublicIpSource │   │ HostIpResolver │   │ UpdateClient │
//! │   (fetch)      │   │  (resolve)     │   │  (update)    │
//! └────────────────┘   └────────────────┘   └──────────────┘
//!         ▲                    ▲                   ▲
//!         └────────────┬───────┴───────────────────┘
//!                      │
//!              ┌──────────────┐        ┌─────────────┐
//!              │  SyncEngine  │───────▶│   Events    │
//!              │ ResolvedState│        │  (notify)   │
//!              └──────────────┘        └─────────────┘
//! ```
//!
//! ## Attempt Flow
//!
//! ```text
//! Idle → ResolvingPublicIp → ResolvingHostIp → Comparing
//!      → { NoActionNeeded | Updating } → Completed | Failed
//! ```
//!
//! 1. Fetch the public IP (failure ends the attempt)
//! 2. Resolve the host IP, honoring the cache and tolerance policy
//! 3. Compare; update when they differ or when forced
//! 4. After a successful update, drop the cached host IP so the next
//!    attempt looks at the freshly published record

use crate::config::SyncConfig;
use crate::error::Result;
use crate::resolver::{HostIpResolver, HostResolution, ResolutionPolicy};
use crate::response::UpdateOutcome;
use crate::state::ResolvedState;
use crate::traits::{HostLookup, PublicIpSource, UpdateClient};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Steps of a single sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    ResolvingPublicIp,
    ResolvingHostIp,
    Comparing,
    NoActionNeeded,
    Updating,
    Completed,
    Failed,
}

/// Result of a completed sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Public and host IP match and no update was forced
    Unchanged {
        /// The address both sides agree on
        ip: Ipv4Addr,
    },

    /// An update request was sent; the provider may still have rejected it
    Updated(UpdateOutcome),
}

impl SyncOutcome {
    /// The provider outcome, if an update was sent
    pub fn update(&self) -> Option<&UpdateOutcome> {
        match self {
            SyncOutcome::Unchanged { .. } => None,
            SyncOutcome::Updated(outcome) => Some(outcome),
        }
    }

    /// `false` only when the provider answered with an `error` token
    pub fn is_success(&self) -> bool {
        self.update().is_none_or(UpdateOutcome::is_success)
    }

    /// Turn a provider rejection into an [`Error`](crate::Error)
    pub fn into_result(self) -> Result<Self> {
        match self {
            SyncOutcome::Updated(outcome) => outcome.into_result().map(SyncOutcome::Updated),
            unchanged => Ok(unchanged),
        }
    }
}

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Public IP fetched
    PublicIpFetched {
        ip: Ipv4Addr,
    },

    /// Host IP obtained from DNS or from the cache
    HostIpResolved {
        ip: Ipv4Addr,
        cached: bool,
    },

    /// Host lookup failed but was tolerated
    HostResolutionTolerated {
        fallback_ip: Ipv4Addr,
        failures: u32,
        reason: String,
    },

    /// No update needed
    UpdateSkipped {
        ip: Ipv4Addr,
    },

    /// Provider accepted the update
    UpdateSucceeded {
        hostname: String,
        new_ip: Ipv4Addr,
        previous_ip: Ipv4Addr,
        response_token: String,
    },

    /// Provider answered with an error token
    UpdateRejected {
        hostname: String,
        response_token: String,
        message: String,
    },

    /// Attempt failed before completing
    SyncFailed {
        phase: SyncPhase,
        error: String,
    },
}

/// Core synchronization engine
///
/// Owns the [`ResolvedState`] and runs one attempt at a time.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::sync()`] whenever a check is due (see
///    [`SyncService`](crate::SyncService) for the periodic loop)
/// 3. State persists across attempts for the life of the engine
///
/// ## Concurrency
///
/// The state sits behind an async mutex held for the whole attempt.
/// Concurrent `sync` calls on the same engine queue up and run one after
/// the other; they never interleave.
pub struct SyncEngine {
    /// Immutable configuration
    config: Arc<SyncConfig>,

    /// Public IP source
    public_ip: Box<dyn PublicIpSource>,

    /// Host IP resolver (cache + tolerance policy)
    resolver: HostIpResolver,

    /// Provider update client
    updater: Box<dyn UpdateClient>,

    /// Run state, locked for the duration of an attempt
    state: Mutex<ResolvedState>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `config`: Engine configuration (see [`SyncConfig::validate_engine`])
    /// - `public_ip`: Public IP source implementation
    /// - `lookup`: DNS lookup implementation for the host name
    /// - `updater`: Provider update client
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// Drain the receiver or drop it: once it holds 64 undelivered events, new
    /// events are discarded.
    pub fn new(
        config: SyncConfig,
        public_ip: Box<dyn PublicIpSource>,
        lookup: Box<dyn HostLookup>,
        updater: Box<dyn UpdateClient>,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate_engine()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let resolver = HostIpResolver::new(
            config.hostname.clone(),
            lookup,
            ResolutionPolicy::from_config(&config),
        );

        let engine = Self {
            config: Arc::new(config),
            public_ip,
            resolver,
            updater,
            state: Mutex::new(ResolvedState::new()),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Replace the initial run state (e.g. to carry a known host IP)
    pub fn with_state(mut self, state: ResolvedState) -> Self {
        self.state = Mutex::new(state);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Snapshot of the current run state
    ///
    /// Waits for an in-flight attempt to finish.
    pub async fn state(&self) -> ResolvedState {
        self.state.lock().await.clone()
    }

    /// Run one synchronization attempt
    ///
    /// # Parameters
    ///
    /// - `force`: Send the update even when the public and host IP match
    ///
    /// # Returns
    ///
    /// - `Ok(SyncOutcome)`: The attempt completed (a provider rejection is
    ///   still `Ok`, see [`SyncOutcome::is_success`])
    /// - `Err(Error)`: The attempt failed; the engine stays usable
    pub async fn sync(&self, force: bool) -> Result<SyncOutcome> {
        let mut state = self.state.lock().await;
        let mut phase = SyncPhase::Idle;

        let result = self.attempt(&mut state, force, &mut phase).await;

        if let Err(e) = &result {
            debug!("Sync attempt failed while {:?}: {}", phase, e);
            self.emit_event(SyncEvent::SyncFailed {
                phase,
                error: e.to_string(),
            });
            self.enter(&mut phase, SyncPhase::Failed);
        }

        result
    }

    async fn attempt(
        &self,
        state: &mut ResolvedState,
        force: bool,
        phase: &mut SyncPhase,
    ) -> Result<SyncOutcome> {
        self.enter(phase, SyncPhase::ResolvingPublicIp);
        let public_ip = self.public_ip.fetch().await?;
        state.public_ip = Some(public_ip);
        self.emit_event(SyncEvent::PublicIpFetched { ip: public_ip });

        self.enter(phase, SyncPhase::ResolvingHostIp);
        let resolution = self.resolver.resolve(state).await?;
        self.report_resolution(&resolution);
        let current_ip = resolution.ip();

        self.enter(phase, SyncPhase::Comparing);
        let has_changed = public_ip != current_ip;
        debug!(
            "Public IP {}, host IP {}, changed: {}",
            public_ip, current_ip, has_changed
        );

        if !has_changed && !force {
            self.enter(phase, SyncPhase::NoActionNeeded);
            self.emit_event(SyncEvent::UpdateSkipped { ip: public_ip });
            self.enter(phase, SyncPhase::Completed);
            return Ok(SyncOutcome::Unchanged { ip: public_ip });
        }

        if has_changed {
            info!(
                "IP drift for {}: {} -> {}",
                self.config.hostname, current_ip, public_ip
            );
        } else {
            info!("Forcing update of {} to {}", self.config.hostname, public_ip);
        }

        self.enter(phase, SyncPhase::Updating);
        let outcome = self.updater.update(public_ip).await?;

        if outcome.is_success() {
            state.invalidate_cache();
            info!(
                "Updated {} -> {} via {} ({})",
                self.config.hostname,
                public_ip,
                self.updater.provider_name(),
                outcome.response_token
            );
            self.emit_event(SyncEvent::UpdateSucceeded {
                hostname: self.config.hostname.clone(),
                new_ip: public_ip,
                previous_ip: current_ip,
                response_token: outcome.response_token.clone(),
            });
        } else {
            warn!(
                "{} rejected update of {} ({}): {}",
                self.updater.provider_name(),
                self.config.hostname,
                outcome.response_token,
                outcome.message
            );
            self.emit_event(SyncEvent::UpdateRejected {
                hostname: self.config.hostname.clone(),
                response_token: outcome.response_token.clone(),
                message: outcome.message.clone(),
            });
        }

        self.enter(phase, SyncPhase::Completed);
        Ok(SyncOutcome::Updated(outcome))
    }

    fn report_resolution(&self, resolution: &HostResolution) {
        match resolution {
            HostResolution::Cached(ip) => {
                debug!("Using cached host IP {} for {}", ip, self.config.hostname);
                self.emit_event(SyncEvent::HostIpResolved { ip: *ip, cached: true });
            }
            HostResolution::Resolved(ip) => {
                self.emit_event(SyncEvent::HostIpResolved { ip: *ip, cached: false });
            }
            HostResolution::Tolerated { ip, failures, reason } => {
                self.emit_event(SyncEvent::HostResolutionTolerated {
                    fallback_ip: *ip,
                    failures: *failures,
                    reason: reason.clone(),
                });
            }
        }
    }

    fn enter(&self, phase: &mut SyncPhase, next: SyncPhase) {
        debug!("Sync phase {:?} -> {:?}", phase, next);
        *phase = next;
    }

    /// Emit an engine event
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Event channel full, dropping event");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("public_ip", &self.public_ip.describe())
            .field("resolver", &self.resolver)
            .field("updater", &self.updater.provider_name())
            .finish_non_exhaustive()
    }
}
