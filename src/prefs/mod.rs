//! Per-installation preferences.
//!
//! The screen persists a single flag today (`hideDisabled`); the store is a
//! flat key-value contract so the file format can grow without migrations.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

pub const HIDE_DISABLED: &str = "hideDisabled";

const APP_DIR: &str = "usergrid";
const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preferences at {path} are not a JSON object: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("preference `{0}` is not a boolean")]
    NotBoolean(String),
    #[error("no configuration directory is available on this platform")]
    NoConfigDir,
}

pub trait PreferenceStore: Send + Sync {
    fn load_bool(&self, key: &str) -> Result<Option<bool>, PrefsError>;
    fn store_bool(&self, key: &str, value: bool) -> Result<(), PrefsError>;
}

/// Reads the hide-disabled flag, treating a missing or unreadable value as
/// `true`.
pub fn load_hide_disabled(store: &dyn PreferenceStore) -> bool {
    match store.load_bool(HIDE_DISABLED) {
        Ok(value) => value.unwrap_or(true),
        Err(error) => {
            warn!(%error, "falling back to default hideDisabled");
            true
        }
    }
}

/// JSON object on disk, one key per preference.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<config dir>/usergrid/preferences.json`.
    pub fn default_location() -> Result<Self, PrefsError> {
        let base = dirs::config_dir().ok_or(PrefsError::NoConfigDir)?;
        Ok(Self::new(base.join(APP_DIR).join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, serde_json::Value>, PrefsError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| PrefsError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let payload = serde_json::to_string_pretty(entries).map_err(|source| {
            PrefsError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        let mut file = File::create(&self.path).map_err(|source| self.io_error(source))?;
        file.write_all(payload.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.flush())
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> PrefsError {
        PrefsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn load_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        match self.read()?.get(key) {
            None => Ok(None),
            Some(serde_json::Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(PrefsError::NotBoolean(key.to_string())),
        }
    }

    fn store_bool(&self, key: &str, value: bool) -> Result<(), PrefsError> {
        // Unreadable files are overwritten rather than blocking the toggle.
        let mut entries = self.read().unwrap_or_default();
        entries.insert(key.to_string(), serde_json::Value::Bool(value));
        self.write(&entries)?;
        debug!(key, value, path = %self.path.display(), "preference stored");
        Ok(())
    }
}

/// Process-local store; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    entries: Arc<Mutex<BTreeMap<String, bool>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.lock().insert(key.to_string(), value);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, bool>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        Ok(self.lock().get(key).copied())
    }

    fn store_bool(&self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }
}
