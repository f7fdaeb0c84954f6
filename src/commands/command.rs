use std::fmt;

use crate::commands::context::Context;

/// Entry point of a command module.
pub type RunFn = fn(&dyn Context) -> CommandResult;

/// A registered launcher command: a stable key, the label shown in menus, and
/// the function that runs it.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    pub run: RunFn,
}

impl Command {
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, run: RunFn) -> Self {
        Self {
            name,
            description,
            run,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Outcome of running a command, interpreted by the navigation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The side effect started or completed.
    Success,
    /// The user picked "← Back" inside the command's own menu.
    Back,
    /// The user dismissed a menu.
    Cancelled,
    /// The command could not do its work.
    Failed(String),
}

impl CommandResult {
    pub fn failed(message: impl Into<String>) -> Self {
        CommandResult::Failed(message.into())
    }
}
