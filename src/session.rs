use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::constants::SESSION_AUTH_KEY;
use crate::error::StorageError;

const SESSION_FILE: &str = "session.json";

/// Persisted client-side flags, the equivalent of the browser's local storage
#[derive(Clone, Debug)]
pub struct SessionStore {
    base_path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a session store under the default directory ("./session")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from("./session"),
        }
    }

    /// Create a session store under a custom directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self) -> PathBuf {
        self.base_path.join(SESSION_FILE)
    }

    /// Whether the user is marked as authenticated; false when nothing is stored
    pub fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self
            .load()?
            .get(SESSION_AUTH_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub fn set_authenticated(&self, authenticated: bool) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(SESSION_AUTH_KEY.to_string(), Value::Bool(authenticated));
        self.save(&entries)
    }

    /// Remove the authentication flag, keeping any other entries
    pub fn clear_authenticated(&self) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(SESSION_AUTH_KEY).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(self.file_path(), json)?;
        Ok(())
    }
}
