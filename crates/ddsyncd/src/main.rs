// # ddsyncd - ddsync Daemon
//
// Thin integration layer: all sync logic lives in ddsync-core.
//
// The ddsyncd daemon is responsible for:
// 1. Loading configuration (JSON options file + environment variables)
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP public IP source, hickory lookup and dyndns2 client
// 4. Running one sync (`runService=false`) or the periodic service
//
// ## Configuration
//
// - `DDSYNC_CONFIG_FILE`: JSON options file (`hostname`, `username`, `password`,
//   `publicIpUrl`, `updateIpUrl`, `checkInterval`, ...)
// - `DDSYNC_HOSTNAME`, `DDSYNC_USERNAME`, `DDSYNC_PASSWORD`: Override the file
// - `DDSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// See `settings.rs` for the full list.
//
// ## Example
//
// ```bash
// export DDSYNC_HOSTNAME=home.example.com
// export DDSYNC_USERNAME=generated-user
// export DDSYNC_PASSWORD=generated-password
// export DDSYNC_CHECK_INTERVAL=300
//
// ddsyncd
// ```

mod logging;
mod settings;

use anyhow::Result;
use ddsync_core::engine::SyncEvent;
use ddsync_core::{
    DaemonConfig, Error, ServiceConfig, SyncConfig, SyncEngine, SyncOutcome, SyncService,
    UpdateClient,
};
use ddsync_ip_http::HttpPublicIpSource;
use ddsync_provider_dyndns2::Dyndns2Client;
use ddsync_resolver_hickory::HickoryHostLookup;
use settings::Settings;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown (or a successful one-shot sync)
/// - 1: Configuration or startup error
/// - 2: Runtime error (failed one-shot sync, exhausted error budget)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdsyncExitCode> for ExitCode {
    fn from(code: DdsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match settings::load(|name| std::env::var(name).ok()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdsyncExitCode::ConfigError.into();
        }
    };

    if let Err(code) = prepare(&settings) {
        return code.into();
    }

    info!("Starting ddsyncd for {}", settings.config.sync.hostname);
    debug!("Configuration: {:?}", settings.config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(settings.config)).into()
}

/// Validate the configuration, then install logging
///
/// Nothing is logged (and no log file is opened) for a rejected configuration.
fn prepare(settings: &Settings) -> std::result::Result<(), DdsyncExitCode> {
    if let Err(e) = settings.config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return Err(DdsyncExitCode::ConfigError);
    }

    if let Err(e) = logging::init(&settings.config.service, settings.log_level) {
        eprintln!("Logging setup error: {:#}", e);
        return Err(DdsyncExitCode::ConfigError);
    }

    Ok(())
}

/// Run the daemon
async fn run_daemon(config: DaemonConfig) -> DdsyncExitCode {
    let (engine, event_rx) = match build_engine(&config.sync) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdsyncExitCode::ConfigError;
        }
    };
    let events = tokio::spawn(log_events(event_rx));

    let code = if config.service.run_service {
        match ShutdownSignals::install() {
            Ok(mut signals) => {
                run_service(engine, &config.service, async move { signals.recv().await }).await
            }
            Err(e) => {
                error!("Startup error: {:#}", e);
                DdsyncExitCode::ConfigError
            }
        }
    } else {
        run_once(&engine).await
    };

    events.abort();
    code
}

/// Perform a single sync and report its status
async fn run_once(engine: &SyncEngine) -> DdsyncExitCode {
    match engine.sync(false).await.and_then(SyncOutcome::into_result) {
        Ok(outcome) => {
            info!("Sync finished: {:?}", outcome);
            DdsyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            DdsyncExitCode::RuntimeError
        }
    }
}

/// Run the periodic service until shutdown or an exhausted error budget
///
/// # Parameters
///
/// - `engine`: Engine driven by the service
/// - `service`: Scheduler settings
/// - `shutdown`: Resolves with the name of the shutdown signal
async fn run_service<F>(engine: SyncEngine, service: &ServiceConfig, shutdown: F) -> DdsyncExitCode
where
    F: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    let sync_service = match SyncService::new(Arc::new(engine), service.clone()) {
        Ok(sync_service) => sync_service,
        Err(e) => {
            error!("Startup error: {}", e);
            return DdsyncExitCode::ConfigError;
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let run = sync_service.run_with_shutdown(Some(shutdown_rx));
    tokio::pin!(run);

    let (result, signalled) = tokio::select! {
        result = &mut run => (result, false),
        signal = &mut shutdown => {
            info!("Received shutdown signal: {}", signal);
            let _ = shutdown_tx.send(());
            // Let an in-flight attempt finish
            (run.await, true)
        }
    };

    match result {
        Ok(()) => {
            info!("Shutting down daemon");
            DdsyncExitCode::CleanShutdown
        }
        Err(Error::ErrorBudgetExhausted { count }) if !service.exit_on_max_errors => {
            if !signalled {
                warn!(
                    "Sync service stopped after {} consecutive errors; idling until a shutdown signal",
                    count
                );
                let signal = shutdown.await;
                info!("Received shutdown signal: {}", signal);
            }
            DdsyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DdsyncExitCode::RuntimeError
        }
    }
}

/// Wire the concrete I/O implementations into an engine
fn build_engine(config: &SyncConfig) -> Result<(SyncEngine, mpsc::Receiver<SyncEvent>)> {
    let public_ip = HttpPublicIpSource::from_config(config)?;
    let lookup = HickoryHostLookup::system_or_default();
    let updater = Dyndns2Client::from_config(config)?;

    info!(
        "Public IP via {}, updates via {}",
        config.public_ip_url,
        updater.provider_name()
    );

    let parts = SyncEngine::new(
        config.clone(),
        Box::new(public_ip),
        Box::new(lookup),
        Box::new(updater),
    )?;

    Ok(parts)
}

/// Drain engine events into the debug log
async fn log_events(mut event_rx: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// SIGTERM/SIGINT listener, installed before the service starts
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

        Ok(Self { sigterm, sigint })
    }

    /// Wait for the next signal, returning its name
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Ctrl-C listener for non-Unix platforms
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
