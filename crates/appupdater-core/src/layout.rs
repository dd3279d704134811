use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::UpdaterConfig;

/// Paths touched by one helper run. The staging area and debug logs live under
/// the work directory; everything that gets replaced lives under the install
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLayout {
    work_dir: PathBuf,
    install_root: PathBuf,
    updates_dir_name: String,
    ready_dir_name: String,
    log_dir_name: String,
    version_record: String,
    app_executable: String,
}

impl UpdateLayout {
    pub fn new(
        work_dir: impl Into<PathBuf>,
        install_root: impl Into<PathBuf>,
        config: &UpdaterConfig,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            install_root: install_root.into(),
            updates_dir_name: config.updates_dir.clone(),
            ready_dir_name: config.ready_dir.clone(),
            log_dir_name: config.log_dir.clone(),
            version_record: config.version_record.clone(),
            app_executable: config.app_executable.clone(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn updates_dir(&self) -> PathBuf {
        self.work_dir.join(&self.updates_dir_name)
    }

    pub fn ready_dir(&self) -> PathBuf {
        self.updates_dir().join(&self.ready_dir_name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.work_dir.join(&self.log_dir_name)
    }

    pub fn version_record_path(&self) -> PathBuf {
        self.install_root.join(&self.version_record)
    }

    pub fn app_executable_path(&self) -> PathBuf {
        self.install_root.join(&self.app_executable)
    }

    pub fn crash_report_dir(&self) -> PathBuf {
        self.install_root.join("tdumps")
    }
}

/// Per-user data directory for `product`, used when the install directory is
/// not writable.
pub fn default_data_dir(product: &str) -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data = std::env::var("APPDATA")
            .context("APPDATA is not set; cannot resolve Windows data directory")?;
        return Ok(PathBuf::from(app_data).join(product));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve data directory")?;
    Ok(PathBuf::from(home).join(".local").join("share").join(product))
}
