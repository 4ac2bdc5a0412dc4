//! File logging. The terminal belongs to the calendar view, so log lines go
//! to a rotating file under the per-user data directory.

use crate::storage;
use anyhow::{anyhow, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use std::fs;

pub const LOG_ENV: &str = "PRODCAL_LOG";

const LOG_FILE_BASENAME: &str = "prodcal";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts the file logger. Keep the returned handle alive for the life of the
/// process; dropping it flushes and stops logging.
pub fn init_logging() -> Result<LoggerHandle> {
    let level = match std::env::var(LOG_ENV) {
        Ok(raw) => normalize_level(&raw)?,
        Err(_) => default_log_level(),
    };
    let dir = storage::log_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;

    let handle = Logger::try_with_str(level)
        .with_context(|| format!("invalid log level `{}`", level))?
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
        .context("starting logger")?;

    info!(
        "prodcal {} started, level={} dir={}",
        env!("CARGO_PKG_VERSION"),
        level,
        dir.display()
    );
    Ok(handle)
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(anyhow!(
            "unsupported log level `{}`; expected trace|debug|info|warn|error|off",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_normalized() {
        assert_eq!(normalize_level(" WARNING ").unwrap(), "warn");
        assert_eq!(normalize_level("Trace").unwrap(), "trace");
        assert!(normalize_level("loud").is_err());
    }
}
