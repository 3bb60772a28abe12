//! Storage Module
//!
//! The single in-memory key-value map shared by every client session.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │                Store                  │
//! │   RwLock<HashMap<String, String>>     │
//! │                                       │
//! │   get / keys   -> shared read lock    │
//! │   set / delete -> exclusive write lock│
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use mapdb::storage::{Store, StoreError};
//!
//! let store = Store::new();
//! store.set("name", "mapDB");
//! assert_eq!(store.get("name"), Ok("mapDB".to_string()));
//!
//! store.delete("name");
//! assert_eq!(store.get("name"), Err(StoreError::KeyNotFound));
//! ```

pub mod engine;

pub use engine::{Store, StoreError};
