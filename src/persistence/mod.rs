//! Key-value persistence
//!
//! Small string values under string keys: the high score and the settings
//! blob. Backends:
//! - `MemoryStore`: in-process map (tests, hosts without storage)
//! - `JsonFileStore`: one JSON object file (native)
//! - `LocalStorageStore`: browser LocalStorage (wasm32)

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;

pub use memory::MemoryStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String storage keyed by name
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Read a number; missing, unreadable or unparsable values are `None`
    fn get(&self, key: &str) -> Option<u64> {
        match self.read(key) {
            Ok(Some(raw)) => match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Ignoring malformed value under {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StorageError> {
        self.write(key, &value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl KeyValueStore for Broken {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_get_parses_numbers() {
        let mut store = MemoryStore::new();
        store.set("score", 1234).unwrap();
        assert_eq!(store.get("score"), Some(1234));
        assert_eq!(store.read("score").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_get_tolerates_garbage() {
        let mut store = MemoryStore::new();
        store.write("score", "not a number").unwrap();
        assert_eq!(store.get("score"), None);
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_read_failure_is_none() {
        let mut store = Broken;
        assert_eq!(store.get("score"), None);
        assert!(store.set("score", 1).is_err());
    }
}
