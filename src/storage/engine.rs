//! Thread-Safe Key-Value Store
//!
//! This module implements the storage engine behind mapDB: a plain
//! `HashMap<String, String>` guarded by a single reader/writer lock.
//!
//! ## Design Decisions
//!
//! 1. **One RwLock over the whole map**: readers never block each other, and a
//!    writer excludes every reader and every other writer, so a `get` can
//!    never see a half-applied `set`.
//! 2. **String values**: anything handed to [`Store::set`] is stored as its
//!    string representation.
//! 3. **No persistence**: the map lives as long as the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Errors returned by store lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested key is not present
    #[error("key not found")]
    KeyNotFound,
}

/// The key-value store shared by all client sessions.
///
/// # Thread Safety
///
/// Wrap it in an `Arc` and hand a clone to every session. All operations take
/// `&self`.
///
/// # Example
///
/// ```
/// use mapdb::storage::Store;
///
/// let store = Store::new();
/// store.set("counter", 10);
/// assert_eq!(store.get("counter").unwrap(), "10");
/// ```
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // A writer that panicked mid-call cannot leave a torn entry behind:
    // HashMap::insert/remove either ran to completion or never started.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if the key is absent.
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        self.read().get(key).cloned().ok_or(StoreError::KeyNotFound)
    }

    /// Inserts or overwrites `key`. The value is stored via its `ToString`
    /// representation.
    pub fn set(&self, key: impl Into<String>, value: impl ToString) {
        let value = value.to_string();
        self.write().insert(key.into(), value);
    }

    /// Removes `key` if present.
    ///
    /// Deleting a missing key is not an error. The return value only says
    /// whether something was actually removed.
    pub fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Returns a snapshot of the keys present at the time of the call.
    ///
    /// The order is unspecified.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
