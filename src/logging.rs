//! Logger bootstrap for the sidecar.
//!
//! stdout carries IPC responses, so logs go to stderr, or to rotating files
//! when a log directory is configured.

use anyhow::{anyhow, Context};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use std::path::{Path, PathBuf};

pub const LEVEL_ENV: &str = "BEHAVIORD_LOG";
pub const DIR_ENV: &str = "BEHAVIORD_LOG_DIR";

const LOG_FILE_BASENAME: &str = "behaviord";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

/// Settings read from the environment; invalid values fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let level = std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|v| normalize_level(&v).ok())
            .unwrap_or("info");
        let log_dir = std::env::var(DIR_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { level, log_dir }
    }
}

/// Starts the logger. The returned handle must stay alive for the life of the
/// process.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<LoggerHandle> {
    let logger = Logger::try_with_str(settings.level)
        .with_context(|| format!("invalid log level `{}`", settings.level))?;
    let handle = match settings.log_dir.as_deref() {
        Some(dir) => {
            let dir = normalize_log_dir(dir)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
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
                .context("failed to start file logger")?
        }
        None => logger
            .log_to_stderr()
            .format(flexi_logger::detailed_format)
            .start()
            .context("failed to start stderr logger")?,
    };
    info!(
        "event=app_start module=logging status=ok level={} version={}",
        settings.level,
        env!("CARGO_PKG_VERSION")
    );
    Ok(handle)
}

fn normalize_level(level: &str) -> anyhow::Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(anyhow!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

fn normalize_log_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    if !dir.is_absolute() {
        return Err(anyhow!(
            "log directory must be an absolute path, got `{}`",
            dir.display()
        ));
    }
    Ok(dir.to_path_buf())
}
