//! Logging setup.
//!
//! Two layers share one `EnvFilter`:
//! - a JSON file layer, rolled daily under the app data directory
//! - a human-readable stderr layer
//!
//! Stdout is left alone because it carries command replies.
//! `log` macros used across the crate are bridged into `tracing`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const APP_DIR: &str = "bazaar-query";
const LOG_FILE: &str = "bazaar-query.log";
const DEFAULT_FILTER: &str = "info";

/// `<data_dir>/bazaar-query/logs`, or `./logs` when there is no data dir.
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging into `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive
/// until shutdown. Calling this twice leaves the first subscriber in place.
pub fn init(log_dir: &Path) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory {}: {}", log_dir.display(), e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = env_filter();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(filter.clone());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_target(false)
        .with_filter(filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
        return guard;
    }

    // try_init installs the log bridge itself; this only matters when that
    // feature is compiled out.
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("LogTracer not installed: {}", e);
    }

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE)
    );

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir_is_app_scoped() {
        let dir = default_log_dir();
        assert!(dir.ends_with("logs"));
        if dirs::data_dir().is_some() {
            assert!(dir.parent().is_some_and(|p| p.ends_with(APP_DIR)));
        }
    }

    #[test]
    fn test_init_creates_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let guard = init(&dir);
        assert!(dir.is_dir());
        drop(guard);
    }
}
