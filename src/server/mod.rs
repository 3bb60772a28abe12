//! Server Module
//!
//! Owns the listening socket. Every accepted connection becomes a
//! [`Session`](crate::session::Session) running in its own Tokio task, so the
//! accept loop never waits on a client.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Accept loop                             │
//! │   owns TcpListener + SessionRegistry                        │
//! └───────┬──────────────────────────────────────▲──────────────┘
//!         │ accept() + spawn                     │ session id
//!         ▼                                      │ (mpsc, on exit)
//! ┌──────────────┐  ┌──────────────┐  ┌──────────┴───┐
//! │  Session 1   │  │  Session 2   │  │  Session N   │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        └─────────────────┼─────────────────┘
//!                          ▼
//!                   Arc<Store>, Arc<CommandRegistry>
//! ```

pub mod acceptor;
pub mod sessions;

pub use acceptor::{Server, ServerConfig};
pub use sessions::{SessionId, SessionRegistry};
