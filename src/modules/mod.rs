//! Command modules
//!
//! Each module is a thin wrapper around one external tool. It exposes a
//! `command()` descriptor for the registry, decodes its own `[commands.<name>]`
//! section, handles direct-launch arguments, and otherwise presents its own menu
//! headed by "← Back".

use std::fmt::Display;

use log::warn;

use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::commands::registry::{Registry, RegistryError};
use crate::launcher::LauncherError;
use crate::navigation::BACK;

pub mod bookmarks;
pub mod clipboard;
pub mod kill;
pub mod man;
pub mod music;
pub mod netstats;
pub mod power;
pub mod radio;
pub mod record;
pub mod screenshot;
pub mod weather;
pub mod wifi;

/// All built-in commands, in default registration order
#[must_use]
pub fn all() -> Vec<Command> {
    vec![
        power::command(),
        screenshot::command(),
        record::command(),
        radio::command(),
        music::command(),
        clipboard::command(),
        wifi::command(),
        weather::command(),
        bookmarks::command(),
        kill::command(),
        netstats::command(),
        man::command(),
    ]
}

/// Registry holding every built-in command.
///
/// # Errors
///
/// Returns `RegistryError::Duplicate` if two modules share a name.
pub fn registry() -> Result<Registry, RegistryError> {
    Registry::from_commands(all())
}

/// Intermediate result inside a module: `Err` carries the outcome to return
/// immediately (back, cancel, failure).
pub(crate) type Step<T> = Result<T, CommandResult>;

pub(crate) fn finish(step: Step<CommandResult>) -> CommandResult {
    step.unwrap_or_else(|exit| exit)
}

fn launcher_exit(error: LauncherError) -> CommandResult {
    match error {
        LauncherError::Cancelled => CommandResult::Cancelled,
        other => CommandResult::Failed(other.to_string()),
    }
}

/// Show a module menu headed by "← Back".
pub(crate) fn submenu(ctx: &dyn Context, options: &[String], prompt: &str) -> Step<String> {
    let mut entries = Vec::with_capacity(options.len() + 1);
    entries.push(BACK.to_string());
    entries.extend_from_slice(options);
    match ctx.show(&entries, prompt) {
        Ok(choice) if choice == BACK => Err(CommandResult::Back),
        Ok(choice) => Ok(choice),
        Err(e) => Err(launcher_exit(e)),
    }
}

/// Ask for free-form text (an empty option list lets the user type).
pub(crate) fn input(ctx: &dyn Context, prompt: &str) -> Step<String> {
    ctx.show(&[], prompt).map_err(launcher_exit)
}

/// Yes/no question; anything but "Yes" counts as no.
pub(crate) fn confirm(ctx: &dyn Context, question: &str) -> Step<bool> {
    let options = ["Yes".to_string(), "No".to_string()];
    match ctx.show(&options, question) {
        Ok(choice) => Ok(choice == "Yes"),
        Err(LauncherError::Cancelled) => Ok(false),
        Err(e) => Err(launcher_exit(e)),
    }
}

/// Report an operational failure with a notification and turn it into `Failed`.
pub(crate) fn fail<E: Display>(ctx: &dyn Context, summary: &str) -> impl FnOnce(E) -> CommandResult {
    move |error| {
        let message = error.to_string();
        warn!("{summary}: {message}");
        ctx.notifier().error(summary, &message);
        CommandResult::failed(format!("{summary}: {message}"))
    }
}

/// Failure for a direct-launch action the module does not know.
pub(crate) fn unknown_action(ctx: &dyn Context, module: &str, usage: &str) -> CommandResult {
    let action = ctx.args().join(" ");
    fail(ctx, module)(format!("unknown action '{action}' (usage: ql {module} {usage})"))
}


#[cfg(test)]
mod tests {
    use super::testing::TestContext;
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), all().len());
    }

    #[test]
    fn test_submenu_back_and_cancel() {
        let ctx = TestContext::new(&[BACK]);
        let options = vec!["One".to_string()];
        assert_eq!(submenu(&ctx, &options, "x"), Err(CommandResult::Back));
        assert_eq!(submenu(&ctx, &options, "x"), Err(CommandResult::Cancelled));
        assert_eq!(ctx.shown.borrow()[0], vec![BACK.to_string(), "One".to_string()]);
    }

    #[test]
    fn test_confirm_only_accepts_yes() {
        let ctx = TestContext::new(&["Yes", "No"]);
        assert_eq!(confirm(&ctx, "Sure?"), Ok(true));
        assert_eq!(confirm(&ctx, "Sure?"), Ok(false));
        // cancelled
        assert_eq!(confirm(&ctx, "Sure?"), Ok(false));
    }

    #[test]
    fn test_unknown_action_notifies() {
        let ctx = TestContext::new(&[]).with_args(&["dance"]);
        let result = unknown_action(&ctx, "power", "<action>");
        assert!(matches!(result, CommandResult::Failed(ref m) if m.contains("unknown action 'dance'")));
        assert_eq!(ctx.notifier.sent.borrow().len(), 1);
    }
}
