use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use tracing::Level;

pub(crate) fn debug_log_path(log_dir: &Path, started_at: DateTime<Local>) -> PathBuf {
    log_dir.join(format!("{}_upd.txt", started_at.format("%Y%m%d_%H%M%S")))
}

/// Installs a file-backed subscriber for the rest of the process. Every event
/// is written to the file as it happens.
pub(crate) fn init_debug_log(log_dir: &Path, started_at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;
    let path = debug_log_path(log_dir, started_at);
    let file = File::create(&path)
        .with_context(|| format!("failed to create debug log: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(Level::DEBUG)
        .try_init()
        .map_err(|err| anyhow!("failed to install debug logger: {err}"))?;
    Ok(path)
}
