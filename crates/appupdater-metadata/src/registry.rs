use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use appupdater_core::default_data_dir;

pub type RegistryValues = BTreeMap<String, String>;

/// Registry-style key/value store used for the package-management metadata.
pub trait RegistryStore {
    /// Returns `None` when the key does not exist.
    fn read_key(&self, key: &str) -> Result<Option<RegistryValues>>;

    /// Sets `values` on an existing key, keeping the values it already has.
    fn write_values(&self, key: &str, values: &[(&str, String)]) -> Result<()>;
}

/// Stores each key as a `name=value` file under `root`; backslash-separated
/// key segments become nested directories.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        let segments = key.split('\\').collect::<Vec<_>>();
        let mut path = self.root.clone();
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() || *segment == "." || *segment == ".." || segment.contains('/')
            {
                return Err(anyhow!("invalid registry key segment '{segment}' in '{key}'"));
            }
            if index + 1 == segments.len() {
                path.push(format!("{segment}.reg"));
            } else {
                path.push(segment);
            }
        }
        Ok(path)
    }

    /// Creates `key` with `values`, replacing anything stored before.
    pub fn create_key(&self, key: &str, values: &RegistryValues) -> Result<PathBuf> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, serialize_values(values)?)
            .with_context(|| format!("failed to write registry key: {}", path.display()))?;
        Ok(path)
    }
}

impl RegistryStore for FileRegistry {
    fn read_key(&self, key: &str) -> Result<Option<RegistryValues>> {
        let path = self.key_path(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read registry key: {}", path.display()));
            }
        };
        Ok(Some(parse_values(&raw)))
    }

    fn write_values(&self, key: &str, values: &[(&str, String)]) -> Result<()> {
        let mut current = self
            .read_key(key)?
            .ok_or_else(|| anyhow!("registry key not found: {key}"))?;
        for (name, value) in values {
            current.insert((*name).to_string(), value.clone());
        }
        self.create_key(key, &current)?;
        Ok(())
    }
}

pub fn default_registry_root(product: &str) -> Result<PathBuf> {
    Ok(default_data_dir(product)?.join("registry"))
}

fn serialize_values(values: &RegistryValues) -> Result<String> {
    let mut payload = String::new();
    for (name, value) in values {
        if name.is_empty() || name.contains(['=', '\n', '\r']) {
            return Err(anyhow!("invalid registry value name: {name:?}"));
        }
        if value.contains(['\n', '\r']) {
            return Err(anyhow!("registry value '{name}' must not contain newlines"));
        }
        payload.push_str(&format!("{name}={value}\n"));
    }
    Ok(payload)
}

fn parse_values(raw: &str) -> RegistryValues {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
