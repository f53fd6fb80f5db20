//! Preset persistence
//!
//! A single named slot in a key-value store holds one persisted snapshot.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sq_core::{SqError, SqResult};

use crate::Snapshot;

/// Default slot key
pub const DEFAULT_PRESET_KEY: &str = "channelStripPreset";

/// Durable string key-value storage
pub trait KeyValueStore {
    /// Stored value, `None` if the key was never written
    fn get(&self, key: &str) -> SqResult<Option<String>>;

    /// Overwrite the value under `key`
    fn set(&mut self, key: &str, value: &str) -> SqResult<()>;
}

/// In-memory store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would grow the store beyond `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> SqResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> SqResult<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(SqError::PersistenceFailure(format!(
                    "Quota exceeded: {} bytes needed, {} allowed",
                    needed, quota
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory
    pub fn in_default_dir() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sequencer")
            .join("presets")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> SqResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SqError::PersistenceFailure(e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> SqResult<()> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(self.path_for(key), value))
            .map_err(|e| SqError::PersistenceFailure(e.to_string()))
    }
}

/// Single-slot preset store
#[derive(Debug)]
pub struct PresetStore<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PresetStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_PRESET_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the slot with `snapshot`
    pub fn save(&mut self, snapshot: &Snapshot) -> SqResult<()> {
        let data = snapshot.to_persistable()?;
        self.store.set(&self.key, &data)?;
        log::info!("Preset saved to slot '{}' ({} bytes)", self.key, data.len());
        Ok(())
    }

    /// Read the slot back
    pub fn load(&self) -> SqResult<Snapshot> {
        let data = self.store.get(&self.key)?.ok_or(SqError::NoPresetFound)?;
        let snapshot = Snapshot::from_persistable(&data)?;
        log::info!("Preset loaded from slot '{}'", self.key);
        Ok(snapshot)
    }

    pub fn has_preset(&self) -> SqResult<bool> {
        Ok(self.store.get(&self.key)?.is_some())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AutomationPoint, ParameterCurve, SessionState};

    fn snapshot() -> Snapshot {
        let mut session = SessionState::new(ParameterCurve::default());
        session.set_pan(0.3).unwrap();
        session
            .automation_mut()
            .insert(AutomationPoint::new(64.0, 0.5));
        Snapshot::capture(&session)
    }

    #[test]
    fn test_load_empty_slot() {
        let store = PresetStore::new(MemoryStore::new());
        assert!(matches!(store.load(), Err(SqError::NoPresetFound)));
        assert!(!store.has_preset().unwrap());
    }

    #[test]
    fn test_save_overwrites_slot() {
        let mut store = PresetStore::new(MemoryStore::new());
        let first = snapshot();
        store.save(&first).unwrap();

        let mut second = first.clone();
        second.pan = -0.6;
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn test_quota_rejection_is_persistence_failure() {
        let mut store = PresetStore::new(MemoryStore::with_quota(16));
        let err = store.save(&snapshot()).unwrap_err();
        assert!(matches!(err, SqError::PersistenceFailure(_)));
        assert!(matches!(store.load(), Err(SqError::NoPresetFound)));
    }

    #[test]
    fn test_garbage_in_slot_is_malformed() {
        let mut kv = MemoryStore::new();
        kv.set(DEFAULT_PRESET_KEY, "{\"version\":1}").unwrap();
        let store = PresetStore::new(kv);
        assert!(matches!(store.load(), Err(SqError::MalformedSnapshot(_))));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PresetStore::new(FileStore::new(dir.path().join("presets")));
        assert!(matches!(store.load(), Err(SqError::NoPresetFound)));

        let snap = snapshot();
        store.save(&snap).unwrap();
        assert!(dir.path().join("presets").join("channelStripPreset.json").exists());

        let reopened = PresetStore::new(FileStore::new(dir.path().join("presets")));
        assert_eq!(reopened.load().unwrap(), snap);
    }
}
