//! Response cache for generated study text.
//!
//! Keys come from [`fingerprint`]; values are the raw text returned by the
//! upstream model. Writes never fail from the caller's point of view: a
//! quota error wipes the store and retries the write once, and any other
//! failure is logged and dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::store::{DEFAULT_QUOTA_BYTES, FileStore, MemoryStore};
use super::{CacheStore, ContentKind, fingerprint};
use crate::telemetry;
use crate::{AcebotError, Result};

/// Default key namespace.
pub const DEFAULT_NAMESPACE: &str = "acebot";

/// Eviction policy for the response cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Durable file store; no expiry; wipe everything when the quota is hit.
    #[default]
    WipeOnQuota,
    /// In-memory LRU with optional TTL.
    Lru,
}

/// Configuration for the response cache.
///
/// ```rust
/// # use acebot::cache::{CacheConfig, CachePolicy};
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .policy(CachePolicy::Lru)
///     .max_entries(500)
///     .ttl(Duration::from_secs(86_400));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prefix for every key. Default: "acebot".
    pub namespace: String,
    pub policy: CachePolicy,
    /// File location for `WipeOnQuota`. Default: `~/.cache/acebot/responses.json`.
    pub path: Option<PathBuf>,
    /// Byte quota for `WipeOnQuota`. Default: 5 MiB.
    pub quota_bytes: usize,
    /// Entry bound for `Lru`. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live for `Lru`. Default: none.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            policy: CachePolicy::default(),
            path: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            max_entries: 1_000,
            ttl: None,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn quota_bytes(mut self, bytes: usize) -> Self {
        self.quota_bytes = bytes;
        self
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Text response cache keyed by request fingerprint.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
}

impl ResponseCache {
    /// Build the store selected by `config.policy`.
    pub fn new(config: &CacheConfig) -> Self {
        let store: Arc<dyn CacheStore> = match config.policy {
            CachePolicy::WipeOnQuota => {
                let path = config.path.clone().unwrap_or_else(FileStore::default_path);
                Arc::new(FileStore::open(path, config.quota_bytes))
            }
            CachePolicy::Lru => Arc::new(MemoryStore::with_limits(config.max_entries, config.ttl)),
        };
        Self::with_store(store, config.namespace.clone())
    }

    /// Wrap an existing store.
    pub fn with_store(store: Arc<dyn CacheStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Fingerprint for a logical request in this cache's namespace.
    pub fn key(&self, kind: ContentKind, subject: &str, chapter: &str) -> String {
        fingerprint(&self.namespace, kind, subject, chapter)
    }

    /// Look up a fingerprint. Store errors count as a miss.
    pub fn get(&self, fingerprint: &str) -> Option<String> {
        match self.store.get(fingerprint) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = fingerprint, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Look up a logical request. Emits hit/miss metrics.
    pub fn lookup(&self, kind: ContentKind, subject: &str, chapter: &str) -> Option<String> {
        let key = self.key(kind, subject, chapter);
        let hit = self.get(&key);
        if hit.is_some() {
            debug!(key = %key, "cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => kind.as_str()).increment(1);
        } else {
            debug!(key = %key, "cache miss");
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "kind" => kind.as_str()).increment(1);
        }
        hit
    }

    /// Store a value. Never fails.
    ///
    /// On a quota error the whole store is cleared and the write retried
    /// once.
    pub fn set(&self, fingerprint: &str, value: &str) {
        match self.store.set(fingerprint, value) {
            Ok(()) => {}
            Err(AcebotError::CacheQuotaExceeded) => {
                warn!(key = fingerprint, "cache quota exceeded, clearing all entries");
                metrics::counter!(telemetry::CACHE_WIPES_TOTAL).increment(1);
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "cache clear failed");
                    return;
                }
                if let Err(e) = self.store.set(fingerprint, value) {
                    warn!(key = fingerprint, error = %e, "cache write failed after clearing");
                }
            }
            Err(e) => warn!(key = fingerprint, error = %e, "cache write failed"),
        }
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
