//! Daemon configuration loading
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. JSON options file named by `DDSYNC_CONFIG_FILE`
//! 3. Individual `DDSYNC_*` environment variables
//!
//! Variables are read through a lookup function so tests never touch the
//! process environment.

use anyhow::{Context, Result};
use ddsync_core::DaemonConfig;
use std::fmt::Display;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Path of the optional JSON options file
pub const CONFIG_FILE_VAR: &str = "DDSYNC_CONFIG_FILE";

/// Log level override
pub const LOG_LEVEL_VAR: &str = "DDSYNC_LOG_LEVEL";

/// Everything the daemon needs to start
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: DaemonConfig,
    pub log_level: LevelFilter,
}

/// Load settings from a JSON file and variable overrides
///
/// # Parameters
///
/// - `var`: Variable lookup, `|name| std::env::var(name).ok()` in production
pub fn load<F>(var: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match var(CONFIG_FILE_VAR).filter(|path| !path.trim().is_empty()) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {} ({})", CONFIG_FILE_VAR, path))?;
            DaemonConfig::from_json(&text)
                .with_context(|| format!("Failed to parse options file {}", path))?
        }
        None => DaemonConfig::default(),
    };

    apply_overrides(&mut config, &var)?;

    let log_level = match var(LOG_LEVEL_VAR) {
        Some(level) => LevelFilter::from_str(level.trim()).map_err(|_| {
            anyhow::anyhow!(
                "{} '{}' is not valid. Valid levels: off, trace, debug, info, warn, error",
                LOG_LEVEL_VAR,
                level
            )
        })?,
        None if config.sync.debug => LevelFilter::DEBUG,
        None => LevelFilter::INFO,
    };

    Ok(Settings { config, log_level })
}

fn apply_overrides<F>(config: &mut DaemonConfig, var: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let sync = &mut config.sync;
    override_string(var, "DDSYNC_HOSTNAME", &mut sync.hostname);
    override_string(var, "DDSYNC_USERNAME", &mut sync.username);
    override_string(var, "DDSYNC_PASSWORD", &mut sync.password);
    override_string(var, "DDSYNC_PUBLIC_IP_URL", &mut sync.public_ip_url);
    override_string(var, "DDSYNC_UPDATE_IP_URL", &mut sync.update_ip_url);
    override_string(var, "DDSYNC_USER_AGENT", &mut sync.user_agent);
    override_bool(var, "DDSYNC_FAIL_ON_UNRESOLVED", &mut sync.fail_on_unresolved_host_name)?;
    override_parsed(var, "DDSYNC_MAX_UNRESOLVED_FAIL", &mut sync.max_unresolved_host_name_fail)?;
    override_bool(var, "DDSYNC_USE_HOST_CACHE", &mut sync.use_host_ip_address_cache)?;
    override_parsed(var, "DDSYNC_HOST_CACHE_EXPIRES", &mut sync.host_ip_address_cache_expires)?;
    override_bool(var, "DDSYNC_DEBUG", &mut sync.debug)?;

    let service = &mut config.service;
    override_bool(var, "DDSYNC_RUN_SERVICE", &mut service.run_service)?;
    override_parsed(var, "DDSYNC_CHECK_INTERVAL", &mut service.check_interval)?;
    override_parsed(var, "DDSYNC_MAX_CONSECUTIVE_ERRORS", &mut service.max_consecutive_errors)?;
    override_bool(var, "DDSYNC_EXIT_ON_MAX_ERRORS", &mut service.exit_on_max_errors)?;
    override_bool(var, "DDSYNC_LOG_TO_CONSOLE", &mut service.log_to_console)?;

    if let Some(path) = var("DDSYNC_LOG_PATH") {
        let path = path.trim();
        service.log_path = match path {
            "" | "false" => None,
            _ => Some(path.to_string()),
        };
    }

    Ok(())
}

fn override_string<F>(var: &F, name: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = var(name) {
        *target = value;
    }
}

fn override_parsed<F, T>(var: &F, name: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = var(name) {
        *target = value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a non-negative integer. Got '{}': {}", name, value, e))?;
    }
    Ok(())
}

fn override_bool<F>(var: &F, name: &str, target: &mut bool) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = var(name) {
        *target = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => anyhow::bail!("{} must be true or false. Got '{}'", name, value),
        };
    }
    Ok(())
}
