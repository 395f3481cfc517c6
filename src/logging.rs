use crate::models::AppConfig;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of the daily log files
pub const LOG_PREFIX: &str = "cloudpane";

/// Filter for the configured verbosity.
///
/// `RUST_LOG` wins when set, so task internals can be traced
/// (`RUST_LOG=cloudpane::task=trace`) without touching the settings file.
pub fn build_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

fn ensure_log_dir(log_dir: &str) -> Result<()> {
    let log_path = Utf8PathBuf::from(log_dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

/// Setup logging with a rotating file appender and optional console output.
///
/// Logs are written to `config.log_dir` with daily rotation through a
/// non-blocking writer, so worker threads never wait on disk I/O.
///
/// # Arguments
/// * `config` - Application settings (`log_dir`, `debug_mode`, `console_output`)
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(config: &AppConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    ensure_log_dir(&config.log_dir)?;

    let file_appender = rolling::daily(&config.log_dir, LOG_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    // Thread names carry the task label and run generation ("log-groups-3")
    let console_layer = config.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_thread_names(true)
    });

    tracing_subscriber::registry()
        .with(build_filter(config.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, debug={}, console={}",
        config.log_dir,
        config.debug_mode,
        config.console_output
    );

    Ok(guard)
}
