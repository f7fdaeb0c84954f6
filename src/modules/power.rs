//! Session and power management through `systemctl` and `loginctl`

use serde::Deserialize;

use super::{Step, confirm, fail, finish, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools;

pub const NAME: &str = "power";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Ask before logging out, rebooting or shutting down
    pub confirm: bool,
    pub lock_command: Vec<String>,
    pub logout_command: Vec<String>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            confirm: true,
            lock_command: vec!["loginctl".into(), "lock-session".into()],
            logout_command: vec!["loginctl".into(), "terminate-session".into(), "self".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Lock,
    Logout,
    Suspend,
    Hibernate,
    Reboot,
    Shutdown,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Lock,
        Action::Logout,
        Action::Suspend,
        Action::Hibernate,
        Action::Reboot,
        Action::Shutdown,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Action::Lock => "Lock",
            Action::Logout => "Log out",
            Action::Suspend => "Suspend",
            Action::Hibernate => "Hibernate",
            Action::Reboot => "Reboot",
            Action::Shutdown => "Shut down",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "lock" => Some(Action::Lock),
            "logout" | "log-out" | "exit" => Some(Action::Logout),
            "suspend" | "sleep" => Some(Action::Suspend),
            "hibernate" => Some(Action::Hibernate),
            "reboot" | "restart" => Some(Action::Reboot),
            "shutdown" | "poweroff" | "power-off" => Some(Action::Shutdown),
            _ => None,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.label() == label)
    }

    /// Actions that end the session
    #[must_use]
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Action::Logout | Action::Reboot | Action::Shutdown)
    }

    #[must_use]
    pub fn argv(self, config: &PowerConfig) -> Vec<String> {
        let systemctl = |verb: &str| vec!["systemctl".to_string(), verb.to_string()];
        match self {
            Action::Lock => config.lock_command.clone(),
            Action::Logout => config.logout_command.clone(),
            Action::Suspend => systemctl("suspend"),
            Action::Hibernate => systemctl("hibernate"),
            Action::Reboot => systemctl("reboot"),
            Action::Shutdown => systemctl("poweroff"),
        }
    }
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Power", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: PowerConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return match Action::from_key(&ctx.args()[0]) {
            Some(action) => perform(ctx, action, &config),
            None => unknown_action(ctx, NAME, "lock|logout|suspend|hibernate|reboot|shutdown"),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &PowerConfig) -> Step<CommandResult> {
    let options: Vec<String> = Action::ALL.iter().map(|a| a.label().to_string()).collect();
    loop {
        let choice = submenu(ctx, &options, "Power")?;
        let Some(action) = Action::from_label(&choice) else {
            continue;
        };
        if config.confirm
            && action.needs_confirmation()
            && !confirm(ctx, &format!("{}?", action.label()))?
        {
            continue;
        }
        return Ok(perform(ctx, action, config));
    }
}

fn perform(ctx: &dyn Context, action: Action, config: &PowerConfig) -> CommandResult {
    let argv = action.argv(config);
    let Some((program, args)) = argv.split_first() else {
        return fail(ctx, "Power")(format!("no command configured for {}", action.label()));
    };
    match tools::run(program, args) {
        Ok(()) => CommandResult::Success,
        Err(e) => fail(ctx, "Power")(e),
    }
}
