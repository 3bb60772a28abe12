//! Session Module
//!
//! One session per client connection, each running in its own task.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Acceptor spawns the session
//!        │
//!        ▼
//! 2. "Welcome to mapDB!" is written
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  Frame a line (up to '\n')   │
//!    │             │                │
//!    │             ▼                │
//!    │  Look up command, check      │
//!    │  privilege, execute          │
//!    │             │                │
//!    │             ▼                │
//!    │  Write the reply             │
//!    │             │                │
//!    │        [Loop back]           │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. EOF, I/O error or `exit`
//!        │
//!        ▼
//! 5. Transport shut down, session ends
//! ```

pub mod handler;

pub use handler::{Session, SessionError, SessionState, MAX_LINE_LENGTH, WELCOME};
