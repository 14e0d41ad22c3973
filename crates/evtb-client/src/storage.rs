//! Credential storage backends.
//!
//! A small synchronous key/value store of strings, the client-side
//! equivalent of browser local storage. Values are opaque to the store;
//! [`TokenManager`](crate::TokenManager) owns their format.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{ApiError, ApiResult};

/// Key/value storage for persisted session data.
///
/// Implementations must be safe to share between tasks. There is no
/// locking across processes: the last writer wins.
pub trait CredentialStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the backend cannot be read.
    fn get(&self, key: &str) -> ApiResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> ApiResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the backend cannot be written.
    fn remove(&self, key: &str) -> ApiResult<()>;
}

/// In-memory store, for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
///
/// Every read goes to disk so that writes from another process are seen.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the per-user config directory (`<config_dir>/evtb`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the platform has no config directory.
    pub fn default_location() -> ApiResult<Self> {
        dirs::config_dir()
            .map(|p| Self::new(p.join("evtb")))
            .ok_or_else(|| {
                ApiError::Configuration("could not determine config directory".to_string())
            })
    }

    /// Returns the directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> ApiResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(ApiError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys double as file names: non-empty `[A-Za-z0-9_-]` only.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            ApiError::Storage(format!("failed to create {}: {e}", self.dir.display()))
        })?;
        fs::write(&path, value)
            .map_err(|e| ApiError::Storage(format!("failed to write {}: {e}", path.display())))?;
        tracing::debug!(?path, "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(?path, "Removed value");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
