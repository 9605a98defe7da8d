//! Config store clients.
//!
//! `MemoryConfigStore` holds records in process (static `[alerters]` entries
//! from the config file, or test fixtures). `FileConfigStore` reads one JSON
//! document per key from a directory.

use crate::core::{AlerterConfig, ConfigStore};
use crate::errors::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, trace};

/// An in-process store of serialised `AlerterConfig` records.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from typed configs, serialising each one.
    pub fn from_configs(configs: &HashMap<String, AlerterConfig>) -> Result<Self, serde_json::Error> {
        let mut records = HashMap::with_capacity(configs.len());
        for (key, config) in configs {
            records.insert(key.clone(), serde_json::to_string(config)?);
        }
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Stores a raw payload for a key, replacing any previous one.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<String>) {
        if let Ok(mut records) = self.records.write() {
            records.insert(key.into(), payload.into());
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn fetch_alerter_config(&self, key: &str) -> Result<String, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        records
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

/// Reads `<dir>/<key>.json` for each lookup.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let unsafe_key = key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..");
        if unsafe_key {
            return None;
        }
        Some(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn fetch_alerter_config(&self, key: &str) -> Result<String, StoreError> {
        let path = self.path_for(key).ok_or_else(|| {
            debug!(key, "Rejecting alert key that is not a plain file name");
            StoreError::NotFound(key.to_string())
        })?;
        trace!(path = %path.display(), "Reading alerter config");

        match tokio::fs::read_to_string(&path).await {
            Ok(payload) => Ok(payload),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.to_string())),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
