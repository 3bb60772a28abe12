//! # mapDB - A Minimal In-Memory Key-Value Store
//!
//! mapDB keeps string keys and values in memory and serves them over a
//! plain-text, newline-terminated TCP protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              mapDB                               │
//! │                                                                  │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐      │
//! │  │   Server    │───>│   Session   │───>│ CommandRegistry  │      │
//! │  │ (Acceptor)  │    │ (per client)│    │ + privilege check│      │
//! │  └─────────────┘    └─────────────┘    └────────┬─────────┘      │
//! │                                                 │                │
//! │                                                 ▼                │
//! │                                  ┌──────────────────────────┐    │
//! │                                  │          Store           │    │
//! │                                  │ RwLock<HashMap<String,_>>│    │
//! │                                  └──────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use mapdb::server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::bind(&ServerConfig::default()).await?;
//!     server.run_until_ctrl_c().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! ```text
//! S: Welcome to mapDB!
//! C: set foo bar
//! S: OK
//! C: get foo
//! S: bar
//! C: exit
//! S: Bye!
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: the shared key-value store
//! - [`privilege`]: access levels and the access check
//! - [`commands`]: command trait, registry and built-in commands
//! - [`session`]: per-connection read/dispatch/write loop
//! - [`server`]: listener and session spawning

pub mod commands;
pub mod privilege;
pub mod server;
pub mod session;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{Command, CommandRegistry};
pub use privilege::AccessLevel;
pub use server::{Server, ServerConfig};
pub use session::{Session, SessionError, SessionState};
pub use storage::{Store, StoreError};

/// The port mapDB listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host mapDB binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of mapDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
