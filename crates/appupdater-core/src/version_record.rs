use std::fs;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Largest accepted byte length of the UTF-16LE version string.
pub const MAX_VERSION_STRING_BYTES: u32 = 63;

/// Installed-version record written by the main application:
/// `u32 LE version`, `u32 LE byte length`, then the UTF-16LE version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub version: u32,
    pub version_string: String,
}

impl VersionRecord {
    /// Returns `None` for truncated records, oversized strings and version 0.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let version = read_u32_le(bytes, 0)?;
        let length = read_u32_le(bytes, 4)?;
        if length > MAX_VERSION_STRING_BYTES {
            return None;
        }

        let payload = bytes.get(8..8 + length as usize)?;
        if version == 0 {
            return None;
        }

        // An odd trailing byte cannot form a code unit and is dropped.
        let units = payload
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();

        Some(Self {
            version,
            version_string: String::from_utf16_lossy(&units),
        })
    }

    /// Serializes the record. Fails when the version string does not fit in
    /// `MAX_VERSION_STRING_BYTES`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let units = self.version_string.encode_utf16().collect::<Vec<_>>();
        let length = u32::try_from(units.len() * 2)
            .ok()
            .filter(|length| *length <= MAX_VERSION_STRING_BYTES)
            .ok_or_else(|| {
                anyhow!(
                    "version string '{}' exceeds {MAX_VERSION_STRING_BYTES} bytes",
                    self.version_string
                )
            })?;

        let mut out = Vec::with_capacity(8 + units.len() * 2);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&length.to_le_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        Ok(out)
    }

    /// Reads the record at `path`. A missing file or an unusable record yields
    /// `Ok(None)`.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read version record: {}", path.display()));
            }
        };
        Ok(Self::parse(&bytes))
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
