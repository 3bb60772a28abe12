//! Bookkeeping for live sessions.
//!
//! Owned by the accept loop alone. Sessions never touch it directly; they
//! report their end over a channel and the loop removes them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Identifier handed out to each accepted connection.
pub type SessionId = u64;

/// Table of currently connected sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: SessionId,
    active: HashMap<SessionId, String>,
    /// Mirror of `active.len()` readable from outside the accept loop
    count: Arc<AtomicUsize>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that publishes its size through `count`.
    pub fn with_counter(count: Arc<AtomicUsize>) -> Self {
        count.store(0, Ordering::Relaxed);
        Self {
            count,
            ..Self::default()
        }
    }

    /// Records a new session and returns its id. Ids are never reused.
    pub fn add(&mut self, addr: impl Into<String>) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, addr.into());
        self.count.store(self.active.len(), Ordering::Relaxed);
        id
    }

    /// Forgets a session, returning its address if it was known.
    pub fn remove(&mut self, id: SessionId) -> Option<String> {
        let removed = self.active.remove(&id);
        self.count.store(self.active.len(), Ordering::Relaxed);
        removed
    }

    pub fn get(&self, id: SessionId) -> Option<&str> {
        self.active.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
