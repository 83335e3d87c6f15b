//! File logging for the diary.
//!
//! The terminal belongs to the UI, so records go to rotating files under the
//! diary directory. Events carry dates and sizes only, never entry text.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;

const LOG_FILE_BASENAME: &str = "diary";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` in `log_dir`.
///
/// Repeating the call with the same arguments is a no-op; a different level
/// or directory is refused.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let level = normalize_level(level)?;

    let active = LOGGING.get_or_try_init(|| -> Result<ActiveLogger> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {}: {e}", log_dir.display()))?;

        let handle = Logger::try_with_str(level)
            .map_err(|e| anyhow!("Invalid log level {level}: {e}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|e| anyhow!("Failed to start logger: {e}"))?;

        install_panic_hook();
        info!(
            "event=app_start version={} level={level}",
            env!("CARGO_PKG_VERSION")
        );

        Ok(ActiveLogger {
            level,
            dir: log_dir.to_path_buf(),
            _handle: handle,
        })
    })?;

    if active.dir != log_dir {
        return Err(anyhow!(
            "Logging already writes to {}; refusing to switch to {}",
            active.dir.display(),
            log_dir.display()
        ));
    }
    if active.level != level {
        return Err(anyhow!(
            "Logging already runs at {}; refusing to switch to {level}",
            active.level
        ));
    }
    Ok(())
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) { "debug" } else { "info" }
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(anyhow!(
            "Unsupported log level {other:?}; expected trace|debug|info|warn|error"
        )),
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!("event=panic location={location}");
        previous(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert_eq!(normalize_level("trace").unwrap(), "trace");
    }

    #[test]
    fn normalize_level_rejects_unknown_values() {
        let err = normalize_level("verbose").unwrap_err();
        assert!(err.to_string().contains("Unsupported log level"));
    }

    #[test]
    fn init_is_idempotent_and_refuses_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let other = tmp.path().join("other");

        init_logging("info", &dir).unwrap();
        init_logging("INFO", &dir).unwrap();
        assert!(dir.is_dir());

        let err = init_logging("debug", &dir).unwrap_err();
        assert!(err.to_string().contains("refusing to switch"));
        let err = init_logging("info", &other).unwrap_err();
        assert!(err.to_string().contains("refusing to switch"));
    }
}
