//! Command Module
//!
//! Maps the first word of a client line to a command and runs it against the
//! store.
//!
//! ## Architecture
//!
//! ```text
//!   "set foo bar"
//!         │
//!         ▼
//! ┌─────────────────┐
//! │ CommandRegistry │  name → Box<dyn Command>
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ privilege check │  (done by the session)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Command::execute│──> Store
//! └─────────────────┘
//! ```
//!
//! The registry is built explicitly and injected into each session, so tests
//! can swap in their own commands.

pub mod handler;
pub mod registry;

pub use handler::{FAREWELL, INVALID_ARGUMENTS, INVALID_COMMAND, OK};
pub use registry::{Command, CommandRegistry, Context};
