//! Tracing subscriber setup
//!
//! Up to two `fmt` layers share one level filter: the console layer
//! (`logToConsole`) and a plain-text file layer appending to `logPath`.

use anyhow::{Context, Result};
use ddsync_core::ServiceConfig;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the global subscriber
pub fn init(service: &ServiceConfig, level: LevelFilter) -> Result<()> {
    let console = service.log_to_console.then(fmt::layer);

    let file = match &service.log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;

            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(level)
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
