// SPDX-License-Identifier: GPL-3.0-only

//! Tracing setup for the lab binary: a stdout layer plus an optional daily
//! rolling file under the state directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing::{Level, Metadata};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LabConfig, LoggingLevel};

/// Least to most verbose. `MAX_VERBOSITY` indexes into this.
const VERBOSITY: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static MAX_VERBOSITY: AtomicU8 = AtomicU8::new(1);

const FILE_PREFIX: &str = "storage-presentable-lab.log";
const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub fn init(config: &LabConfig) {
    set_verbosity(config.log_level);

    let directive = config.log_level.as_directive();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!(
            "{directive},storage_presentable={directive},storage_testing={directive}"
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_filter(filter_fn(verbose_enough));

    let file_layer = if config.log_to_disk {
        match open_log_file(&log_dir()) {
            Ok((writer, guard)) => {
                let _ = FILE_GUARD.set(guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_filter(filter_fn(verbose_enough)),
                )
            }
            Err(e) => {
                eprintln!("lab: file logging disabled: {e:#}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn set_verbosity(level: LoggingLevel) {
    let index = match level {
        LoggingLevel::Error => 0,
        LoggingLevel::Warn => 1,
        LoggingLevel::Info => 2,
        LoggingLevel::Debug => 3,
        LoggingLevel::Trace => 4,
    };
    MAX_VERBOSITY.store(index, Ordering::Relaxed);
}

fn verbose_enough(metadata: &Metadata<'_>) -> bool {
    allows(metadata.level())
}

fn allows(level: &Level) -> bool {
    let max = usize::from(MAX_VERBOSITY.load(Ordering::Relaxed));
    VERBOSITY[..=max.min(VERBOSITY.len() - 1)].contains(level)
}

fn open_log_file(dir: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    prune_logs(dir, SystemTime::now());

    let appender = tracing_appender::rolling::daily(dir, FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// `$STORAGE_PRESENTABLE_LOG_DIR`, else `storage-presentable/logs` under the
/// XDG state directory.
pub fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("STORAGE_PRESENTABLE_LOG_DIR") {
        return PathBuf::from(dir);
    }

    let state_home = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state"))
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"));

    state_home.join("storage-presentable").join("logs")
}

/// Remove rolled lab log files last written before `now - RETENTION`.
fn prune_logs(dir: &Path, now: SystemTime) {
    let Some(cutoff) = now.checked_sub(RETENTION) else {
        return;
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let stale = entries.flatten().filter(|entry| {
        let ours = entry.file_name().to_string_lossy().starts_with(FILE_PREFIX);
        let is_file = entry.file_type().is_ok_and(|kind| kind.is_file());
        let modified = entry.metadata().and_then(|metadata| metadata.modified());
        ours && is_file && modified.is_ok_and(|time| time < cutoff)
    });

    for entry in stale {
        let _ = fs::remove_file(entry.path());
    }
}
