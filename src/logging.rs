use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "advisory.log";

/// Sets up advisory logging: JSON lines in a rotating file under
/// `logging.dir`, plus WARN and above on stderr when enabled.
///
/// Rotated files older than `logging.retention_days` are purged first and the
/// outcome is reported on the `logging_initialized` event. Hold the returned
/// guard until shutdown so buffered lines reach the file.
pub fn install(config: &LoggingConfig, service: &str) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("logging.filter '{}' is not a valid directive", config.filter))?;
    let dir = std::path::absolute(&config.dir)
        .with_context(|| format!("logging.dir {} cannot be resolved", config.dir.display()))?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("logging.dir {} cannot be created", dir.display()))?;

    let keep_for = Duration::from_secs(
        u64::try_from(config.retention_days)
            .unwrap_or(u64::MAX)
            .saturating_mul(24 * 60 * 60),
    );
    let (purged, purge_errors) = purge_older_than(&dir, keep_for, SystemTime::now());

    let appender = match config.rotation {
        LoggingRotation::Daily => rolling::daily(&dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(&dir, LOG_FILE_PREFIX),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(
            fmt::layer()
                .json()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_current_span(true)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter),
        )
        .with(config.stderr_warn_enabled.then(|| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_filter(LevelFilter::WARN)
        }))
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::info!(
        target: "logging",
        service,
        version = env!("CARGO_PKG_VERSION"),
        run_id = %Uuid::now_v7(),
        dir = %dir.display(),
        rotation = ?config.rotation,
        retention_days = config.retention_days,
        purged,
        purge_errors = ?purge_errors,
        "logging_initialized"
    );
    Ok(guard)
}

/// Removes `advisory.log*` files in `dir` last modified at or before
/// `now - keep_for`. Returns how many went and what could not be removed.
fn purge_older_than(dir: &Path, keep_for: Duration, now: SystemTime) -> (usize, Vec<String>) {
    let cutoff = now.checked_sub(keep_for).unwrap_or(SystemTime::UNIX_EPOCH);
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => return (0, vec![format!("{}: {err}", dir.display())]),
    };

    let expired: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .filter(|entry| {
            entry
                .metadata()
                .ok()
                .filter(|meta| meta.is_file())
                .and_then(|meta| meta.modified().ok())
                .is_some_and(|modified| modified <= cutoff)
        })
        .map(|entry| entry.path())
        .collect();

    let mut errors = Vec::new();
    let mut purged = 0;
    for path in expired {
        match fs::remove_file(&path) {
            Ok(()) => purged += 1,
            Err(err) => errors.push(format!("{}: {err}", path.display())),
        }
    }
    (purged, errors)
}
