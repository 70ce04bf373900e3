//! # Logging Setup
//!
//! Tracing subscriber for the console binary.
//!
//! `RUST_LOG` overrides the default `info` filter. When a log directory is
//! configured, events are also written to a daily rolling file.

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Log file name prefix inside the log directory
pub const LOG_FILE_PREFIX: &str = "kip-console.log";

/// Filter from `RUST_LOG`, falling back to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// # Returns
///
/// * `Result<Option<WorkerGuard>>` - Guard for the file writer; keep it
///   alive until exit so buffered lines are flushed
///
/// # Errors
///
/// Returns error if the log directory cannot be created or a subscriber is
/// already installed
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if config.log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr_layer)
            .try_init()
            .context("installing tracing subscriber")?;
        return Ok(None);
    }

    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir))?;
    let (file_writer, guard) = tracing_appender::non_blocking(daily(&config.log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(Some(guard))
}
