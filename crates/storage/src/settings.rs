//! Legacy settings collaborator.
//!
//! Older builds kept per-user preferences (asset ordering, the selected
//! account) in a key-value settings store outside the account store itself.
//! The migration engine reads those values during an upgrade and deletes
//! them once the whole chain has succeeded. The engine only ever sees the
//! [`SettingsStore`] trait; the concrete stores live here.

use crate::error::{Result, StoreError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key-value settings store, read during migration and cleaned up after it.
pub trait SettingsStore: Send + Sync {
    /// Fetch the raw value for `key`, if present.
    fn get(&self, key: &str) -> Option<Value>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access on top of [`SettingsStore`].
pub trait SettingsExt: SettingsStore {
    /// Fetch and deserialize the value for `key`.
    ///
    /// Returns `None` when the key is absent or the value does not have the
    /// requested shape; a malformed legacy value is treated the same as a
    /// missing one.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl<S: SettingsStore + ?Sized> SettingsExt for S {}

/// Settings backed by a JSON file on disk.
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonSettings {
    /// Open the settings file at `path`, creating an empty store if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Settings(format!("unreadable settings file: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(JsonSettings {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set a value and persist.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.into(), value);
        self.save(&values)
    }

    fn save(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(values)
            .map_err(|e| StoreError::Settings(e.to_string()))?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// In-memory settings, for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemorySettings {
    /// Create an empty store.
    pub fn new() -> Self {
        MemorySettings::default()
    }

    /// Set a value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.lock().insert(key.into(), value);
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}
