use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub trait Serializable: Serialize + for<'de> Deserialize<'de> {}

impl<T> Serializable for T where T: Serialize + for<'de> Deserialize<'de> {}

/// JSON helpers shared by everything that persists state on disk.
pub struct Serializer;

impl Serializer {
    pub fn to_json<T: Serializable>(value: &T) -> Result<String> {
        serde_json::to_string(value).context("Failed to serialize to JSON")
    }

    pub fn from_json<T: Serializable>(json: &str) -> Result<T> {
        serde_json::from_str(json).context("Failed to deserialize from JSON")
    }

    pub fn to_json_pretty<T: Serializable>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to serialize to pretty JSON")
    }

    /// Writes `value` as pretty JSON, creating missing parent directories.
    pub fn write_json_file<T: Serializable, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = Self::to_json_pretty(value)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read_json_file<T: Serializable, P: AsRef<Path>>(path: P) -> Result<T> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}
