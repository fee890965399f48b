//! Durable per-device local store.
//!
//! The store is a flat key/value map of opaque strings. Each reconciler owns
//! one key and always rewrites its whole value; there are no partial updates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Keys used in the local store.
pub mod keys {
    /// Serialized `CartLine[]`.
    pub const CART: &str = "cart";

    /// Serialized `ProductSnapshot[]` of recently viewed products.
    pub const VIEW_HISTORY: &str = "viewHistory";
}

/// Errors that can occur when writing to the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Value could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// A durable key/value store local to the device.
pub trait LocalStore {
    /// Read the raw value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key` entirely.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the key exists but cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and deserialize a JSON value.
///
/// An absent or corrupt value reads back as `T::default()`.
pub fn read_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: LocalStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Discarding corrupt local snapshot");
        T::default()
    })
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StoreError` if serialization or the write fails.
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: LocalStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key).ok()?;
        match fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read local snapshot");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mart-store-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_read_json_absent_is_default() {
        let store = MemoryStore::new();
        let value: Vec<String> = read_json(&store, keys::CART);
        assert!(value.is_empty());
    }

    #[test]
    fn test_read_json_corrupt_is_default() {
        let store = MemoryStore::new();
        store.set(keys::CART, "{not json").unwrap();
        let value: Vec<String> = read_json(&store, keys::CART);
        assert!(value.is_empty());
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryStore::new();
        write_json(&store, keys::VIEW_HISTORY, &["a", "b"]).unwrap();
        assert!(store.contains(keys::VIEW_HISTORY));
        store.remove(keys::VIEW_HISTORY).unwrap();
        assert!(!store.contains(keys::VIEW_HISTORY));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_dir("roundtrip");
        let store = FileStore::open(&dir).unwrap();
        write_json(&store, keys::CART, &vec![1, 2, 3]).unwrap();
        let value: Vec<i32> = read_json(&store, keys::CART);
        assert_eq!(value, vec![1, 2, 3]);
        assert!(dir.join("cart.json").exists());
        assert!(!dir.join("cart.json.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = temp_dir("remove");
        let store = FileStore::open(&dir).unwrap();
        store.remove(keys::CART).unwrap();
        assert!(store.get(keys::CART).is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = temp_dir("keys");
        let store = FileStore::open(&dir).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
