//! Caching subsystem.
//!
//! - [`ResponseCache`] sits above the rotator: a hit returns stored text
//!   without touching credentials or the network. Only text responses
//!   (notes, questions) are cached.
//!
//! - [`CacheStore`] is the storage seam. Two backends:
//!   - [`FileStore`]: durable JSON file with a byte quota. Entries never
//!     expire; when a write would exceed the quota the cache wipes the store
//!     and retries once.
//!   - [`MemoryStore`]: in-process moka cache with LRU eviction and an
//!     optional TTL. Never reports quota errors.

pub mod response;
pub mod store;

pub use response::{CacheConfig, CachePolicy, ResponseCache};
pub use store::{FileStore, MemoryStore};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// What a cached text response contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Notes,
    Questions,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Notes => "notes",
            ContentKind::Questions => "questions",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic cache key: `<namespace>_<kind>_<subject>_<chapter>`.
///
/// Whitespace runs inside every part collapse to a single `_`, so incidental
/// spacing differences map to the same key.
///
/// ```rust
/// # use acebot::cache::{fingerprint, ContentKind};
/// assert_eq!(
///     fingerprint("acebot", ContentKind::Notes, "Physics", " Electric Charges  and Fields "),
///     "acebot_notes_Physics_Electric_Charges_and_Fields",
/// );
/// ```
pub fn fingerprint(namespace: &str, kind: ContentKind, subject: &str, chapter: &str) -> String {
    [namespace, kind.as_str(), subject, chapter]
        .iter()
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join("_"))
        .collect::<Vec<_>>()
        .join("_")
}

/// Key-value storage behind [`ResponseCache`].
pub trait CacheStore: Send + Sync {
    /// Look up a value. `Ok(None)` on miss.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    ///
    /// Returns [`AcebotError::CacheQuotaExceeded`](crate::AcebotError::CacheQuotaExceeded)
    /// when the write does not fit.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every entry.
    fn clear(&self) -> Result<()>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
