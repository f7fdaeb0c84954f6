use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::commands::command::Command;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command '{0}' is registered more than once")]
    Duplicate(String),
}

/// Commands available to the launcher, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Command>,
    by_name: HashMap<&'static str, usize>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of commands.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Duplicate` if two commands share a name.
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for command in commands {
            registry.register(command)?;
        }
        Ok(registry)
    }

    /// Add a command.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Duplicate` if a command with the same name exists.
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.by_name.contains_key(command.name) {
            return Err(RegistryError::Duplicate(command.name.to_string()));
        }
        debug!("Registered command '{}'", command.name);
        self.by_name.insert(command.name, self.commands.len());
        self.commands.push(command);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.by_name.get(name).map(|&idx| &self.commands[idx])
    }

    /// Commands in registration order
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
