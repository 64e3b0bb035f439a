use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::core::errors::{GuardError, Result};
use crate::core::models::user_profile::{Role, UserProfile};
use crate::core::traits::profile_store::ProfileStore;

/// Profile collection persisted as a JSON object keyed by user id.
///
/// Field updates (`set_role`, `set_email_verified`) rewrite only the
/// targeted document and stamp `updated_at`, mimicking the per-field
/// merge writes of the production document store. Last write wins.
#[derive(Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    /// Create a store backed by `{data_dir}/users.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("users.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, UserProfile>> {
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

    fn persist(&self, docs: &BTreeMap<String, UserProfile>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(docs).map_err(|e| GuardError::StoreError {
            detail: format!("Failed to serialize user profiles: {e}"),
        })?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ProfileStore for FileProfileStore {
    fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.load()?.get(user_id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self.load()?.values().find(|p| p.email == email).cloned())
    }

    fn upsert(&self, profile: &UserProfile) -> Result<()> {
        let mut docs = self.load()?;
        docs.insert(profile.user_id.clone(), profile.clone());
        self.persist(&docs)
    }

    fn set_role(&self, user_id: &str, role: Role) -> Result<UserProfile> {
        let mut docs = self.load()?;
        let profile = docs.get_mut(user_id).ok_or(GuardError::ProfileNotFound {
            email: user_id.to_string(),
        })?;
        let previous = profile.clone();
        profile.role = role;
        profile.updated_at = Utc::now();
        self.persist(&docs)?;
        Ok(previous)
    }

    fn set_email_verified(&self, user_id: &str, verified: bool) -> Result<()> {
        let mut docs = self.load()?;
        if let Some(profile) = docs.get_mut(user_id) {
            profile.email_verified = verified;
            profile.updated_at = Utc::now();
            self.persist(&docs)?;
        }
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<UserProfile> {
        let mut docs = self.load()?;
        let removed = docs.remove(user_id).ok_or(GuardError::ProfileNotFound {
            email: user_id.to_string(),
        })?;
        self.persist(&docs)?;
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<UserProfile>> {
        Ok(self.load()?.into_values().collect())
    }
}
