use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Durable key-value mirror of the last known record lists.
///
/// Each key is a JSON file holding a plain array of records. There is no
/// expiry and no versioning: the last save for a key wins.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Load the records stored under `key`, or `None` if nothing was saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>> {
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;

        let records: Vec<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", key))?;

        debug!(cache = key, count = records.len(), "Loaded cache");
        Ok(Some(records))
    }

    /// Like `load`, but an unreadable entry counts as empty.
    pub fn load_or_empty<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.load(key) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(cache = key, error = %e, "Ignoring unreadable cache");
                Vec::new()
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        let path = self.cache_path(key);
        let contents = serde_json::to_string_pretty(records)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        debug!(cache = key, count = records.len(), "Saved cache");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
