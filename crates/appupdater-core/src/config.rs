use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "updater.toml";

const DEFAULT_UNINSTALL_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{53F49750-6209-4FBF-9CA8-7A333C87D1ED}_is1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdaterConfig {
    /// File name the helper executable is expected to carry.
    pub helper_name: String,
    /// Main application executable, relative to the install root.
    pub app_executable: String,
    pub product_name: String,
    pub publisher: String,
    pub product_url: String,
    pub updates_dir: String,
    pub ready_dir: String,
    pub log_dir: String,
    /// Installed-version record, relative to the install root.
    pub version_record: String,
    pub uninstall_key: String,
    pub registry_root: Option<PathBuf>,
    pub copy_attempts: u32,
    pub copy_retry_delay_ms: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        let (helper_name, app_executable) = if cfg!(windows) {
            ("Updater.exe", "App.exe")
        } else {
            ("Updater", "App")
        };

        Self {
            helper_name: helper_name.to_string(),
            app_executable: app_executable.to_string(),
            product_name: "App".to_string(),
            publisher: "App Publisher".to_string(),
            product_url: "https://example.com".to_string(),
            updates_dir: "tupdates".to_string(),
            ready_dir: "ready".to_string(),
            log_dir: "DebugLogs".to_string(),
            version_record: "tdata/version".to_string(),
            uninstall_key: DEFAULT_UNINSTALL_KEY.to_string(),
            registry_root: None,
            copy_attempts: 30,
            copy_retry_delay_ms: 100,
        }
    }
}

impl UpdaterConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse updater config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read updater config: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid updater config: {}", path.display()))
    }

    /// Loads `explicit` when given, otherwise `updater.toml` from the work
    /// directory if present, otherwise the defaults.
    pub fn load_or_default(explicit: Option<&Path>, work_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = work_dir.join(CONFIG_FILE_NAME);
        match fs::metadata(&path) {
            Ok(_) => Self::load(&path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to inspect updater config: {}", path.display())),
        }
    }

    fn validate(&self) -> Result<()> {
        validate_file_name("helper_name", &self.helper_name)?;
        validate_relative_path("app_executable", &self.app_executable)?;
        validate_file_name("updates_dir", &self.updates_dir)?;
        validate_file_name("ready_dir", &self.ready_dir)?;
        validate_relative_path("log_dir", &self.log_dir)?;
        validate_relative_path("version_record", &self.version_record)?;
        if self.uninstall_key.trim().is_empty() {
            return Err(anyhow!("uninstall_key must not be empty"));
        }
        if self.product_name.trim().is_empty() {
            return Err(anyhow!("product_name must not be empty"));
        }
        if self.copy_attempts == 0 {
            return Err(anyhow!("copy_attempts must be at least 1"));
        }
        Ok(())
    }
}

fn validate_file_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(anyhow!("{field} must be a plain file name: {value}"));
    }
    Ok(())
}

fn validate_relative_path(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with(['/', '\\']) {
        return Err(anyhow!("{field} must be relative: {value}"));
    }
    if value.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(anyhow!("{field} must not contain '..': {value}"));
    }
    Ok(())
}
