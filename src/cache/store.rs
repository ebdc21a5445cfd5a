//! [`CacheStore`] backends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use super::CacheStore;
use crate::{AcebotError, Result};

/// Default byte quota for [`FileStore`], matching typical browser origin storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Default maximum number of entries in a [`MemoryStore`].
const DEFAULT_MEMORY_MAX: u64 = 1_000;

// ============================================================================
// FileStore
// ============================================================================

/// Durable store persisted as one JSON object.
///
/// The whole map is held in memory and rewritten on every change (atomic
/// write via tmp + rename). Usage is counted as the sum of key and value
/// byte lengths; a write that would exceed `quota_bytes` is rejected with
/// [`AcebotError::CacheQuotaExceeded`].
pub struct FileStore {
    path: PathBuf,
    quota_bytes: usize,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) a store at `path`.
    ///
    /// A missing file starts empty. A corrupt file also starts empty and
    /// logs a warning; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        let path = path.into();
        let entries = load_entries(&path).unwrap_or_default();
        Self {
            path,
            quota_bytes,
            entries: Mutex::new(entries),
        }
    }

    /// Default location: `~/.cache/acebot/responses.json`.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("acebot")
            .join("responses.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    /// Bytes currently used (keys plus values).
    pub fn used_bytes(&self) -> usize {
        usage(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AcebotError::Cache(format!(
                    "failed to create cache dir {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(entries)?;
        std::fs::write(&tmp_path, json).map_err(|e| {
            AcebotError::Cache(format!(
                "failed to write cache file {}: {e}",
                tmp_path.display()
            ))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            AcebotError::Cache(format!(
                "failed to rename cache file {} → {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })
    }
}

fn usage(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn load_entries(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read response cache");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt response cache");
            None
        }
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock();
        let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
        let projected = usage(&entries) - replaced + key.len() + value.len();
        if projected > self.quota_bytes {
            return Err(AcebotError::CacheQuotaExceeded);
        }

        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.lock();
        // Memory follows disk: keep entries if the empty file cannot be written
        self.persist(&BTreeMap::new())?;
        entries.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store backed by moka.
///
/// Bounded by entry count with LRU eviction, plus an optional TTL. Contents
/// are lost when the process exits.
pub struct MemoryStore {
    entries: moka::sync::Cache<String, String>,
}

impl MemoryStore {
    /// Create a store with the default max capacity (1,000) and no TTL.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MEMORY_MAX, None)
    }

    /// Create a store with a custom capacity and optional TTL.
    pub fn with_limits(max_entries: u64, ttl: Option<Duration>) -> Self {
        let mut builder = moka::sync::Cache::builder().max_capacity(max_entries);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            entries: builder.build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.invalidate_all();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }
}
