//! JSON file store (native)
//!
//! All keys live in one JSON object. Writes go to a temp file that is then
//! renamed over the original.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{KeyValueStore, StorageError};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `vapor-jump.json` under the OS temp dir
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("vapor-jump.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.load()?;
        Ok(map.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every later write
        let mut map = self.load().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable {}: {}", self.path.display(), e);
            Map::new()
        });
        map.insert(key.to_string(), Value::String(value.to_string()));

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
