//! Periodic sync service
//!
//! Drives a [`SyncEngine`] on a fixed interval and stops once too many
//! attempts in a row have failed.
//!
//! ## Failure accounting
//!
//! An attempt counts as failed when `sync` returns `Err` or when the
//! provider answered with an `error` token. Any successful attempt resets
//! the counter. A budget of `0` never stops the loop.

use crate::config::ServiceConfig;
use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Consecutive failure counter for the service loop
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorBudget {
    limit: u32,
    consecutive: u32,
}

impl ErrorBudget {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
        }
    }

    /// Reset the counter, returning how many failures preceded this success
    fn record_success(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive)
    }

    /// Count a failure, returning `true` once the budget is used up
    fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.limit > 0 && self.consecutive >= self.limit
    }
}

/// Scheduler that runs sync attempts until shutdown or error budget exhaustion
pub struct SyncService {
    engine: Arc<SyncEngine>,
    config: ServiceConfig,
}

impl SyncService {
    /// Create a new service
    ///
    /// # Parameters
    ///
    /// - `engine`: Engine to drive (shared so callers can keep observing it)
    /// - `config`: Scheduler settings (validated here)
    pub fn new(engine: Arc<SyncEngine>, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the service until Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error::ErrorBudgetExhausted)`: Too many consecutive failed attempts
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the service with a controlled shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Oneshot receiver that stops the loop; `None` falls
    ///   back to Ctrl-C like [`SyncService::run`]
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let shutdown = async move {
            match shutdown_rx {
                // A dropped sender also counts as a shutdown request
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut budget = ErrorBudget::new(self.config.max_consecutive_errors);

        info!(
            "Sync service started for {} (every {}s, error budget {})",
            self.engine.config().hostname,
            self.config.check_interval,
            self.config.max_consecutive_errors
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, sync service stopped");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    self.tick(&mut budget).await?;
                }
            }
        }
    }

    /// Run one attempt and update the error budget
    async fn tick(&self, budget: &mut ErrorBudget) -> Result<()> {
        match self.engine.sync(false).await.and_then(SyncOutcome::into_result) {
            Ok(outcome) => {
                let previous_failures = budget.record_success();
                if previous_failures > 0 {
                    info!("Sync recovered after {} failed attempt(s)", previous_failures);
                }
                debug!("Sync attempt finished: {:?}", outcome);
                Ok(())
            }
            Err(e) => {
                let exhausted = budget.record_failure();
                error!(
                    "Sync attempt failed ({} in a row): {}",
                    budget.consecutive, e
                );

                if exhausted {
                    error!(
                        "Reached {} consecutive errors, stopping sync service",
                        budget.consecutive
                    );
                    return Err(Error::ErrorBudgetExhausted {
                        count: budget.consecutive,
                    });
                }

                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish()
    }
}
