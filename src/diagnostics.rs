//! Diagnostics for The Small Stock.
//!
//! Provides:
//! - **About info**: version, build timestamp, git SHA, platform, uptime
//! - **Logging**: console + daily rolling file, with old files pruned

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::APP_START_EPOCH;

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// Rolling log file prefix.
const LOG_FILE_PREFIX: &str = "stock";

const APP_IDENTIFIER: &str = "com.thesmall.stock";

// ---------------------------------------------------------------------------
// About info
// ---------------------------------------------------------------------------

pub fn get_about_info() -> Value {
    let start = APP_START_EPOCH.load(Ordering::Relaxed);
    let uptime = if start > 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .saturating_sub(start)
    } else {
        0
    };
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("BUILD_TIMESTAMP"),
        "gitSha": env!("BUILD_GIT_SHA"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "uptimeSeconds": uptime,
    })
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub fn get_log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join(APP_IDENTIFIER).join("logs")
}

/// Prune old log files in `log_dir`, keeping only the most recent `MAX_LOG_FILES`.
pub fn prune_old_logs(log_dir: &Path) {
    if !log_dir.exists() {
        return;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| name.starts_with(&format!("{LOG_FILE_PREFIX}.")))
                .unwrap_or(false);
            if is_log {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(std::time::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }
    }

    // Sort newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to prune log file {}: {e}", path.display());
        }
    }
}

/// Install the global subscriber: env filter, console layer and a daily
/// rolling file in `log_dir`. The returned guard flushes the file writer on
/// drop and must outlive the app.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,the_small_stock_lib=debug"));

    prune_old_logs(log_dir);
    fs::create_dir_all(log_dir).map_err(|e| format!("create log dir: {e}"))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| format!("init logging: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stock_diag_{tag}_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_about_info_has_required_fields() {
        let info = get_about_info();
        assert!(info.get("version").is_some());
        assert!(info.get("buildTimestamp").is_some());
        assert!(info.get("gitSha").is_some());
        assert!(info.get("platform").is_some());
        assert!(info["uptimeSeconds"].is_u64());
    }

    #[test]
    #[serial]
    fn test_log_dir_follows_data_home() {
        let dir = scratch_dir("home");
        let saved_local = std::env::var_os("LOCALAPPDATA");
        let saved_xdg = std::env::var_os("XDG_DATA_HOME");
        std::env::remove_var("LOCALAPPDATA");
        std::env::set_var("XDG_DATA_HOME", &dir);

        let log_dir = get_log_dir();

        match saved_local {
            Some(v) => std::env::set_var("LOCALAPPDATA", v),
            None => std::env::remove_var("LOCALAPPDATA"),
        }
        match saved_xdg {
            Some(v) => std::env::set_var("XDG_DATA_HOME", v),
            None => std::env::remove_var("XDG_DATA_HOME"),
        }

        assert_eq!(log_dir, dir.join(APP_IDENTIFIER).join("logs"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prune_keeps_newest_log_files() {
        let dir = scratch_dir("prune");
        for i in 0..(MAX_LOG_FILES + 3) {
            fs::write(dir.join(format!("stock.2026-01-{:02}", i + 1)), b"log").expect("write");
        }
        fs::write(dir.join("unrelated.txt"), b"keep").expect("write");

        prune_old_logs(&dir);

        let remaining: Vec<_> = fs::read_dir(&dir)
            .expect("read dir")
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("stock."))
            .collect();
        assert_eq!(remaining.len(), MAX_LOG_FILES);
        assert!(dir.join("unrelated.txt").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        prune_old_logs(Path::new("/definitely/not/a/real/log/dir"));
    }
}
