//! Command registry and the contract between the launcher and its modules
//!
//! Every module exposes a `Command` descriptor. The descriptors are collected into a
//! `Registry` once at startup and handed to the navigation controller, which runs the
//! selected command with a `Context` and interprets the returned `CommandResult`.

pub mod command;
pub mod context;
pub mod group;
pub mod registry;
