use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use once_cell::sync::OnceCell;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

const SERVER_LOG: &str = "server.log";
const ERROR_LOG: &str = "error.log";
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Flush handles for the file writers; dropping them loses buffered lines.
static FILE_GUARDS: OnceCell<Vec<WorkerGuard>> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("cannot create log directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("cannot install tracing subscriber: {0}")]
    Install(String),
}

/// Console output plus two JSON files under `LOG_DIR`: everything in
/// `server.log`, ERROR events only in `error.log`. Both roll daily.
pub fn init_logger(cfg: &Config) -> Result<(), LoggerError> {
    let dir = cfg.log_dir.as_path();
    fs::create_dir_all(dir).map_err(|source| LoggerError::CreateDir { path: dir.to_path_buf(), source })?;

    let pruned = match retention(&cfg.log_max_files) {
        Some(max_age) => prune_expired(dir, max_age, SystemTime::now()),
        None => 0,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let console = fmt::layer()
        .with_target(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stdout);
    let (server_file, server_guard) = json_file_layer(dir, SERVER_LOG, Level::TRACE);
    let (error_file, error_guard) = json_file_layer(dir, ERROR_LOG, Level::ERROR);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(server_file)
        .with(error_file)
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))?;

    let _ = FILE_GUARDS.set(vec![server_guard, error_guard]);
    install_panic_hook();

    tracing::info!(dir = %dir.display(), pruned, "logger.ready");
    Ok(())
}

/// A daily-rolling JSON file that only receives events at `max_level` or more severe.
fn json_file_layer<S>(dir: &Path, file_name: &str, max_level: Level) -> (impl Layer<S>, WorkerGuard)
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, file_name));
    let layer = fmt::layer()
        .json()
        .with_target(false)
        .with_thread_ids(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer.with_max_level(max_level));
    (layer, guard)
}

/// Panics become ERROR events so they land in `error.log` with a backtrace.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!(
            panic = %panic_payload(info.payload()),
            location = %location,
            backtrace = %backtrace,
            "process.panic"
        );
    }));
}

fn panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic occurred".to_string()
    }
}

/// `LOG_MAX_FILES` is a day count, with or without a `d` suffix. Zero or an
/// unreadable value keeps logs forever.
fn retention(value: &str) -> Option<Duration> {
    let value = value.trim().to_ascii_lowercase();
    let days = value.strip_suffix('d').unwrap_or(&value).trim().parse::<u32>().ok()?;
    (days > 0).then(|| DAY * days)
}

/// Removes rolled server/error log files last modified before `now - max_age`.
/// Other files in the directory are left alone. Returns how many were removed.
fn prune_expired(dir: &Path, max_age: Duration, now: SystemTime) -> usize {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return 0;
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(SERVER_LOG) || name.starts_with(ERROR_LOG)
        })
        .filter(|entry| {
            let modified = entry.metadata().and_then(|meta| meta.modified());
            matches!(modified, Ok(at) if at < cutoff)
        })
        .filter(|entry| fs::remove_file(entry.path()).is_ok())
        .count()
}
