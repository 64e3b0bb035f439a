use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::errors::{GuardError, Result};
use crate::core::traits::kv_store::KeyValueStore;

/// Key/value store persisted as a single JSON object in one file.
///
/// Reads load the whole map and writes rewrite the whole file, which is
/// fine for the handful of lockout and session keys this tool keeps and
/// leaves the state trivially inspectable (and deletable) by the user.
/// There is no cross-process locking; concurrent invocations race with
/// last-write-wins semantics.
#[derive(Clone)]
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    /// Create a store backed by the given file path. The file is created
    /// lazily on first write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| GuardError::CorruptState {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content =
            serde_json::to_string_pretty(entries).map_err(|e| GuardError::StoreError {
                detail: format!("Failed to serialize state file: {e}"),
            })?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
