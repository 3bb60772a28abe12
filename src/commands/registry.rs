//! The command trait and the registry that maps names to commands.

use crate::privilege::AccessLevel;
use crate::session::SessionState;
use crate::storage::Store;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Everything a command may touch while it runs.
pub struct Context<'a> {
    /// State of the calling session
    pub session: &'a mut SessionState,
    /// The shared key-value store
    pub store: &'a Store,
    /// The registry the command was looked up in (used by `help`)
    pub registry: &'a CommandRegistry,
}

/// A command the server understands.
///
/// `execute` returns the full response text, trailing newline included.
/// Arity is the command's own business: the dispatcher hands over whatever
/// arguments followed the name.
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Minimum access level needed to run this command.
    fn privilege(&self) -> AccessLevel;

    /// Argument hint shown by `help`, if the command takes arguments.
    fn usage(&self) -> Option<&'static str> {
        None
    }

    fn execute(&self, ctx: &mut Context<'_>, args: &[&str]) -> String;
}

/// Immutable name → command table.
///
/// Built once at startup, then shared between sessions behind an `Arc`.
/// Iteration is ordered by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in command.
    pub fn builtin() -> Self {
        use super::handler::*;

        let mut registry = Self::new();
        registry.register(HelpCommand);
        registry.register(ExitCommand);
        registry.register(WhoamiCommand);
        registry.register(GetCommand);
        registry.register(SetCommand);
        registry.register(DelCommand);
        registry.register(KeysCommand);
        registry
    }

    /// Adds a command, returning the one it replaced under the same name.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Option<Box<dyn Command>> {
        self.commands.insert(command.name(), Box::new(command))
    }

    /// Looks up a command by its exact (case-sensitive) name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Iterates over the commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.values().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Renders the usage banner listing every registered command.
    pub fn usage(&self) -> String {
        let mut out = String::from("Usage: <command> [arguments]\n\nCommands:\n");
        for command in self.iter() {
            let _ = writeln!(out, "{} ~ {}", command.name(), command.description());
            if let Some(usage) = command.usage() {
                let _ = writeln!(out, "    Usage: {}", usage);
            }
        }
        out
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}
