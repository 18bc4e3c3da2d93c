//! Local Medium Module
//!
//! String-keyed, string-valued durable storage backing the cache store.
//! No atomicity is promised across keys; the last writer wins.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::MediumError;

/// Synchronous key-value storage local to the client.
pub trait LocalMedium: Send + Sync + fmt::Debug {
    /// Returns the raw payload stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous payload.
    fn set(&self, key: &str, value: &str) -> Result<(), MediumError>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), MediumError>;

    /// Every key currently stored, including ones written by earlier processes.
    fn keys(&self) -> Vec<String>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Memory Medium ==
/// Process-local medium. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl LocalMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        lock(&self.items).remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }
}

// == File Medium ==
/// Medium persisted as one JSON object file, rewritten on every change.
///
/// Survives process restarts. Writes go to a sibling temporary file which is
/// then renamed over the target.
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileMedium {
    // == Constructor ==
    /// Opens the medium at `path`, loading existing contents.
    ///
    /// A missing file starts empty. A file that is not a JSON object of
    /// strings is treated as empty and replaced on the next write.
    ///
    /// # Errors
    /// Returns `MediumError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MediumError> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring corrupt cache file");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), entries = items.len(), "Opened cache file");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), MediumError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string(items)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl LocalMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let mut items = lock(&self.items);
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        let mut items = lock(&self.items);
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_medium_set_get_remove() {
        let medium = MemoryMedium::new();
        medium.set("k", "v").unwrap();
        assert_eq!(medium.get("k").as_deref(), Some("v"));
        assert_eq!(medium.len(), 1);

        assert_eq!(medium.keys(), vec!["k".to_string()]);

        medium.remove("k").unwrap();
        medium.remove("k").unwrap();
        assert!(medium.get("k").is_none());
        assert!(medium.is_empty());
        assert!(medium.keys().is_empty());
    }

    #[test]
    fn test_file_medium_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let medium = FileMedium::open(&path).unwrap();
            medium.set("varieties", "[1,2]").unwrap();
            medium.set("products", "[]").unwrap();
            medium.remove("products").unwrap();
        }

        let reopened = FileMedium::open(&path).unwrap();
        assert_eq!(reopened.get("varieties").as_deref(), Some("[1,2]"));
        assert!(reopened.get("products").is_none());
    }

    #[test]
    fn test_file_medium_keys_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        {
            let medium = FileMedium::open(&path).unwrap();
            medium.set("varieties", "[]").unwrap();
            medium.set("products", "[]").unwrap();
        }

        let reopened = FileMedium::open(&path).unwrap();
        assert_eq!(
            reopened.keys(),
            vec!["products".to_string(), "varieties".to_string()]
        );
    }

    #[test]
    fn test_file_medium_failed_write_keeps_memory_and_disk_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let medium = FileMedium::open(&path).unwrap();
        medium.set("varieties", "[1]").unwrap();

        // a directory in the staging file's place makes every write fail
        fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(medium.remove("varieties").is_err());
        assert_eq!(medium.get("varieties").as_deref(), Some("[1]"));
        assert!(medium.set("products", "[]").is_err());
        assert!(medium.get("products").is_none());

        let reopened = FileMedium::open(&path).unwrap();
        assert_eq!(reopened.keys(), medium.keys());
    }

    #[test]
    fn test_file_medium_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileMedium::open(dir.path().join("nested/dir/cache.json")).unwrap();
        assert!(medium.get("anything").is_none());

        // parent directories are created on first write
        medium.set("k", "v").unwrap();
        assert!(medium.path().exists());
    }

    #[test]
    fn test_file_medium_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let medium = FileMedium::open(&path).unwrap();
        assert!(medium.get("k").is_none());

        medium.set("k", "v").unwrap();
        let reopened = FileMedium::open(&path).unwrap();
        assert_eq!(reopened.get("k").as_deref(), Some("v"));
    }
}
