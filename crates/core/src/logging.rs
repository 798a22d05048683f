//! Logging infrastructure for protoqa.
//!
//! This module initializes the tracing subscriber for structured logging.
//! Logs are emitted to stderr to keep stdout clean for command output, and
//! optionally mirrored to a dated log file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber with stderr output.
///
/// This sets up structured logging with:
/// - Output to stderr (stdout is reserved for data)
/// - Environment-based filtering (RUST_LOG or provided level)
/// - Optional ANSI color control
/// - Optional plain-text copy in `<log_dir>/app_<YYYYMMDD>.log`
///
/// # Example
/// ```no_run
/// use protoqa_core::logging::init_logging;
///
/// init_logging(None, false, None).expect("Failed to initialize logging");
/// ```
pub fn init_logging(
    log_level: Option<&str>,
    no_color: bool,
    log_dir: Option<&Path>,
) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    let file_layer = match log_dir {
        Some(dir) => {
            let file = open_log_file(dir)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_target(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Path of today's log file inside `dir`.
fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d");
    dir.join(format!("app_{}.log", stamp))
}

fn open_log_file(dir: &Path) -> AppResult<File> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::Config(format!("Failed to create log directory {:?}: {}", dir, e))
    })?;
    let path = log_file_path(dir);
    File::create(&path)
        .map_err(|e| AppError::Config(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Check if the terminal supports color output.
fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path_is_dated() {
        let path = log_file_path(Path::new("logs"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("app_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "app_20240101.log".len());
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("QA_Gen_Logs");
        open_log_file(&dir).unwrap();
        assert!(log_file_path(&dir).exists());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = init_logging(Some("protoqa=notalevel"), true, None);
        assert!(result.is_err());
    }
}
