//! Access levels gating command execution.
//!
//! Levels form a total order: `None < Read < ReadWrite < Admin`. A session may
//! run a command only if its own level is at least the command's required
//! level.

use crate::session::SessionState;
use std::fmt;

/// Message written to a client whose session lacks the required level.
pub const ACCESS_DENIED: &str = "Access denied: insufficient privilege\n";

/// Ordered authorization tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    /// Connection-level commands only (`help`, `exit`, `whoami`)
    #[default]
    None,
    /// May read keys
    Read,
    /// May read and modify keys
    ReadWrite,
    /// Everything
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::Read => "read",
            AccessLevel::ReadWrite => "read-write",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `session` is below `required`, i.e. access must be
/// denied.
#[inline]
pub fn requires_at_least(required: AccessLevel, session: &SessionState) -> bool {
    required > session.privilege()
}
