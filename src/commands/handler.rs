//! Built-in Commands
//!
//! ## Supported Commands
//!
//! ### Connection Commands (no privilege needed)
//! - `help` - Print the usage banner
//! - `exit` - Say goodbye and close the connection
//! - `whoami` - Print the client's remote address
//!
//! ### Key Commands
//! - `get key` - Get a key's value (Read)
//! - `keys` - List every key (Read)
//! - `set key value` - Set a key (ReadWrite)
//! - `del key` - Delete a key (ReadWrite)
//!
//! Every command checks its own argument count and answers
//! [`INVALID_ARGUMENTS`] on a mismatch.

use super::registry::{Command, Context};
use crate::privilege::AccessLevel;

/// Reply to a successful mutation.
pub const OK: &str = "OK\n";

/// Reply when a command receives the wrong number of arguments.
pub const INVALID_ARGUMENTS: &str = "Invalid arguments.\n";

/// Reply to a name that matches no registered command.
pub const INVALID_COMMAND: &str = "Invalid command.\n";

/// Reply to `exit`.
pub const FAREWELL: &str = "Bye!\n";

/// Reply to `keys` on an empty store.
pub const EMPTY_LIST: &str = "(empty list)\n";

// ============================================================================
// Connection Commands
// ============================================================================

/// help
pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Displays help information."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::None
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        if !args.is_empty() {
            return INVALID_ARGUMENTS.to_string();
        }
        ctx.registry.usage()
    }
}

/// exit
pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn description(&self) -> &'static str {
        "Exits the server."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::None
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        if !args.is_empty() {
            return INVALID_ARGUMENTS.to_string();
        }
        ctx.session.terminate();
        FAREWELL.to_string()
    }
}

/// whoami
pub struct WhoamiCommand;

impl Command for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn description(&self) -> &'static str {
        "Displays information about the current user."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::None
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        if !args.is_empty() {
            return INVALID_ARGUMENTS.to_string();
        }
        format!("You are connected from {}\n", ctx.session.addr())
    }
}

// ============================================================================
// Key Commands
// ============================================================================

/// get key
pub struct GetCommand;

impl Command for GetCommand {
    fn name(&self) -> &'static str {
        "get"
    }

    fn description(&self) -> &'static str {
        "Returns the value stored at a key."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::Read
    }

    fn usage(&self) -> Option<&'static str> {
        Some("get <key>")
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        let [key] = args else {
            return INVALID_ARGUMENTS.to_string();
        };

        match ctx.store.get(key) {
            Ok(value) => format!("{}\n", value),
            Err(e) => format!("{}\n", e),
        }
    }
}

/// set key value
pub struct SetCommand;

impl Command for SetCommand {
    fn name(&self) -> &'static str {
        "set"
    }

    fn description(&self) -> &'static str {
        "Stores a value at a key, overwriting any previous value."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::ReadWrite
    }

    fn usage(&self) -> Option<&'static str> {
        Some("set <key> <value>")
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        let [key, value] = args else {
            return INVALID_ARGUMENTS.to_string();
        };

        ctx.store.set(*key, value);
        OK.to_string()
    }
}

/// del key
pub struct DelCommand;

impl Command for DelCommand {
    fn name(&self) -> &'static str {
        "del"
    }

    fn description(&self) -> &'static str {
        "Deletes a key. Deleting a missing key is not an error."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::ReadWrite
    }

    fn usage(&self) -> Option<&'static str> {
        Some("del <key>")
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        let [key] = args else {
            return INVALID_ARGUMENTS.to_string();
        };

        ctx.store.delete(key);
        OK.to_string()
    }
}

/// keys
pub struct KeysCommand;

impl Command for KeysCommand {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn description(&self) -> &'static str {
        "Lists every key in the database."
    }

    fn privilege(&self) -> AccessLevel {
        AccessLevel::Read
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String {
        if !args.is_empty() {
            return INVALID_ARGUMENTS.to_string();
        }

        let mut keys = ctx.store.keys();
        if keys.is_empty() {
            return EMPTY_LIST.to_string();
        }

        keys.sort_unstable();
        keys.iter().map(|k| format!("{}\n", k)).collect()
    }
}
