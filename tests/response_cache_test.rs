//! Tests for [`ResponseCache`] and its stores.

use std::sync::Arc;
use std::time::Duration;

use acebot::cache::{
    CacheConfig, CachePolicy, CacheStore, ContentKind, FileStore, MemoryStore, ResponseCache,
    fingerprint,
};

// =========================================================================
// CacheConfig
// =========================================================================

#[test]
fn cache_config_defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.namespace, "acebot");
    assert_eq!(config.policy, CachePolicy::WipeOnQuota);
    assert_eq!(config.quota_bytes, 5 * 1024 * 1024);
    assert!(config.path.is_none());
    assert!(config.ttl.is_none());
}

#[test]
fn cache_config_builder() {
    let config = CacheConfig::new()
        .namespace("study")
        .policy(CachePolicy::Lru)
        .max_entries(500)
        .ttl(Duration::from_secs(60));
    assert_eq!(config.namespace, "study");
    assert_eq!(config.max_entries, 500);
    assert_eq!(config.ttl, Some(Duration::from_secs(60)));
}

// =========================================================================
// Fingerprints
// =========================================================================

#[test]
fn whitespace_variants_share_a_key() {
    let cache = ResponseCache::with_store(Arc::new(MemoryStore::new()), "acebot");
    assert_eq!(
        cache.key(ContentKind::Notes, "Physics", "Electric Charges  and Fields"),
        cache.key(ContentKind::Notes, "Physics", "Electric Charges and Fields"),
    );
}

#[test]
fn key_format() {
    assert_eq!(
        fingerprint("acebot", ContentKind::Questions, "Computer Science", "Python Revision"),
        "acebot_questions_Computer_Science_Python_Revision"
    );
}

// =========================================================================
// Lookup
// =========================================================================

#[test]
fn miss_then_hit() {
    let cache = ResponseCache::with_store(Arc::new(MemoryStore::new()), "acebot");

    assert!(cache.lookup(ContentKind::Notes, "Biology", "Genetics").is_none());

    let key = cache.key(ContentKind::Notes, "Biology", "Genetics");
    cache.set(&key, "TOPIC: Mendel");

    assert_eq!(
        cache.lookup(ContentKind::Notes, "Biology", " Genetics ").as_deref(),
        Some("TOPIC: Mendel")
    );
    // Different kind is a separate entry
    assert!(cache.lookup(ContentKind::Questions, "Biology", "Genetics").is_none());
}

// =========================================================================
// Quota handling
// =========================================================================

#[test]
fn quota_error_wipes_then_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("responses.json"), 64));
    let cache = ResponseCache::with_store(store.clone(), "ns");

    cache.set("first", &"a".repeat(30));
    cache.set("second", &"b".repeat(20));
    assert_eq!(store.len(), 2);

    // Does not fit alongside the others: everything is cleared first
    cache.set("third", &"c".repeat(40));

    assert_eq!(store.len(), 1);
    assert!(cache.get("first").is_none());
    assert!(cache.get("second").is_none());
    assert_eq!(cache.get("third"), Some("c".repeat(40)));
}

#[test]
fn value_larger_than_quota_is_dropped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("responses.json"), 16));
    let cache = ResponseCache::with_store(store.clone(), "ns");

    cache.set("small", "ok");
    cache.set("huge", &"x".repeat(100));

    // The wipe still happened; the oversized value was not stored
    assert!(store.is_empty());
    assert!(cache.get("huge").is_none());
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("responses.json");

    {
        let cache = ResponseCache::new(&CacheConfig::new().path(&path));
        let key = cache.key(ContentKind::Notes, "Chemistry", "Solutions");
        cache.set(&key, "TOPIC: Molarity");
    }

    let reopened = ResponseCache::new(&CacheConfig::new().path(&path));
    assert_eq!(
        reopened
            .lookup(ContentKind::Notes, "Chemistry", "Solutions")
            .as_deref(),
        Some("TOPIC: Molarity")
    );
}

#[test]
fn on_disk_format_is_flat_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.json");
    let store = FileStore::open(&path, 1024);
    store.set("acebot_notes_Physics_Optics", "rays").unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["acebot_notes_Physics_Optics"], "rays");
}

#[test]
fn clear_removes_entries_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.json");
    let cache = ResponseCache::new(&CacheConfig::new().path(&path));
    cache.set("k", "v");

    cache.clear().unwrap();

    let reopened = FileStore::open(&path, 1024);
    assert!(reopened.is_empty());
}

// =========================================================================
// LRU policy
// =========================================================================

#[test]
fn lru_policy_uses_memory_store() {
    let cache = ResponseCache::new(&CacheConfig::new().policy(CachePolicy::Lru));
    cache.set("k", "v");
    assert_eq!(cache.get("k").as_deref(), Some("v"));
    assert_eq!(cache.len(), 1);
}
