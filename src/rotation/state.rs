//! Mutable rotation state: cursor, blacklist, and last rotation reason.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Why the rotator last moved off a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationReason {
    /// Upstream returned 429.
    LimitReached,
    /// Upstream returned 503.
    ServerBusy,
}

impl fmt::Display for RotationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationReason::LimitReached => f.write_str("Limit Reached (429)"),
            RotationReason::ServerBusy => f.write_str("Server Busy (503)"),
        }
    }
}

/// Read-only snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationStatus {
    /// Credentials in the live pool (configured minus blacklisted).
    pub active_credentials: usize,
    /// 1-based index of the credential the next attempt will use, 0 if none.
    pub current_index: usize,
    pub last_reason: Option<RotationReason>,
}

#[derive(Debug, Default)]
struct Inner {
    cursor: usize,
    blacklist: HashSet<String>,
    last_reason: Option<RotationReason>,
}

/// Rotation state owned by one [`KeyRotator`](super::KeyRotator).
///
/// The lock is only taken for short synchronous sections and never held
/// across an await.
#[derive(Debug, Default)]
pub struct ResilienceState {
    inner: Mutex<Inner>,
}

impl ResilienceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cursor at `offset` instead of 0.
    pub fn with_cursor(offset: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                cursor: offset,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// Move to the next credential.
    pub fn advance(&self) {
        let mut inner = self.lock();
        inner.cursor = inner.cursor.wrapping_add(1);
    }

    /// Index into a pool of `len` credentials, or `None` for an empty pool.
    pub fn index_for(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.lock().cursor % len)
    }

    /// Permanently exclude a credential. Returns `false` if it was already listed.
    pub fn blacklist(&self, credential: &str) -> bool {
        self.lock().blacklist.insert(credential.to_string())
    }

    pub fn is_blacklisted(&self, credential: &str) -> bool {
        self.lock().blacklist.contains(credential)
    }

    pub fn blacklist_len(&self) -> usize {
        self.lock().blacklist.len()
    }

    /// Drop blacklisted entries from `pool`, keeping order.
    pub fn filter(&self, pool: Vec<String>) -> Vec<String> {
        let inner = self.lock();
        pool.into_iter()
            .filter(|c| !inner.blacklist.contains(c))
            .collect()
    }

    pub fn last_reason(&self) -> Option<RotationReason> {
        self.lock().last_reason
    }

    pub fn set_reason(&self, reason: RotationReason) {
        self.lock().last_reason = Some(reason);
    }

    pub fn clear_reason(&self) {
        self.lock().last_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_wraps_with_pool_size() {
        let state = ResilienceState::with_cursor(5);
        assert_eq!(state.index_for(2), Some(1));
        assert_eq!(state.index_for(5), Some(0));
        assert_eq!(state.index_for(0), None);
    }

    #[test]
    fn advance_wraps_at_usize_max() {
        let state = ResilienceState::with_cursor(usize::MAX);
        state.advance();
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn filter_removes_blacklisted() {
        let state = ResilienceState::new();
        assert!(state.blacklist("key-bbbbbbbb"));
        assert!(!state.blacklist("key-bbbbbbbb"));
        let pool = vec![
            "key-aaaaaaaa".to_string(),
            "key-bbbbbbbb".to_string(),
            "key-cccccccc".to_string(),
        ];
        assert_eq!(state.filter(pool), vec!["key-aaaaaaaa", "key-cccccccc"]);
    }

    #[test]
    fn reason_display() {
        assert_eq!(RotationReason::ServerBusy.to_string(), "Server Busy (503)");
        assert_eq!(RotationReason::LimitReached.to_string(), "Limit Reached (429)");
    }
}
