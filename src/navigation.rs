//! The hub that turns the registry and config into menus
//!
//! Flat mode shows every enabled command once and exits after running one of them.
//! Grouped mode shows a group list and, inside a group, a module list headed by a
//! "← Back" entry. Leaving a group with "← Back" returns to the group list; a
//! command that reports `Back` from its own submenu returns to its group's module
//! list. Every other outcome, including cancelling any menu, ends the program.

use std::collections::HashSet;

use log::{debug, info, warn};
use thiserror::Error;

use crate::commands::command::{Command, CommandResult};
use crate::commands::context::AppContext;
use crate::commands::group::ModuleGroup;
use crate::commands::registry::Registry;
use crate::config_file::{Config, MenuStyle};
use crate::launcher::{Launcher, LauncherError};
use crate::notify::Notifier;

/// Label of the synthetic entry that leaves a submenu
pub const BACK: &str = "← Back";

#[derive(Error, Debug)]
pub enum NavError {
    #[error("no enabled commands")]
    NoEnabledCommands,
    #[error("no enabled commands in group '{0}'")]
    EmptyGroup(String),
    #[error("unknown group '{requested}'; available groups: {available}")]
    UnknownGroup { requested: String, available: String },
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{0}' is disabled in the config")]
    Disabled(String),
    #[error(transparent)]
    Launcher(#[from] LauncherError),
}

/// How a module list was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuExit {
    /// "← Back" was chosen; show the group list again
    Back,
    /// The program should end
    Done,
}

pub struct Navigator<'a> {
    registry: &'a Registry,
    config: &'a Config,
    launcher: &'a dyn Launcher,
    notifier: &'a dyn Notifier,
}

impl<'a> Navigator<'a> {
    #[must_use]
    pub fn new(
        registry: &'a Registry,
        config: &'a Config,
        launcher: &'a dyn Launcher,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            registry,
            config,
            launcher,
            notifier,
        }
    }

    /// Run the menu in the given style, or open `group` directly.
    ///
    /// # Errors
    ///
    /// Returns `NavError` when nothing can be shown, the group is unknown, or the
    /// menu program fails for a reason other than cancellation.
    pub fn run(&self, style: MenuStyle, group: Option<&str>) -> Result<(), NavError> {
        match (group, style) {
            (Some(query), _) => self.run_group(query),
            (None, MenuStyle::Flat) => self.run_flat(),
            (None, MenuStyle::Grouped) => self.run_grouped(),
        }
    }

    /// Enabled commands in configured order; registered commands missing from
    /// the order list follow in registration order.
    #[must_use]
    pub fn ordered_commands(&self) -> Vec<&'a Command> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(self.registry.len());
        for name in &self.config.menu.module_order {
            match self.registry.get(name) {
                Some(command) => {
                    if seen.insert(command.name) {
                        ordered.push(command);
                    }
                }
                None => debug!("Skipping unregistered module '{name}' in module_order"),
            }
        }
        for command in self.registry.commands() {
            if seen.insert(command.name) {
                ordered.push(command);
            }
        }
        ordered.retain(|command| self.config.is_enabled(command.name));
        ordered
    }

    /// Enabled, registered commands of a group in group order
    #[must_use]
    pub fn group_commands(&self, group: &ModuleGroup) -> Vec<&'a Command> {
        let mut seen = HashSet::new();
        group
            .modules
            .iter()
            .filter_map(|name| {
                let command = self.registry.get(name);
                if command.is_none() {
                    debug!("Skipping unregistered module '{name}' in group '{}'", group.key);
                }
                command
            })
            .filter(|command| self.config.is_enabled(command.name) && seen.insert(command.name))
            .collect()
    }

    /// Enabled groups with at least one enabled command
    #[must_use]
    pub fn visible_groups(&self) -> Vec<&'a ModuleGroup> {
        self.config
            .groups
            .iter()
            .filter(|group| group.enabled && !self.group_commands(group).is_empty())
            .collect()
    }

    /// Show every enabled command and run the chosen one.
    ///
    /// # Errors
    ///
    /// Returns `NavError::NoEnabledCommands` without showing a menu when nothing
    /// is enabled.
    pub fn run_flat(&self) -> Result<(), NavError> {
        let commands = self.ordered_commands();
        if commands.is_empty() {
            return Err(NavError::NoEnabledCommands);
        }
        let options = descriptions(&commands);
        loop {
            let Some(choice) = self.choose(&options, &self.config.menu.prompt)? else {
                info!("Menu cancelled");
                return Ok(());
            };
            let Some(command) = find_command(&commands, &choice) else {
                self.unknown_selection(&choice);
                continue;
            };
            self.execute(command, Vec::new());
            return Ok(());
        }
    }

    /// Show the group list, then the chosen group's module list.
    ///
    /// # Errors
    ///
    /// Returns `NavError::NoEnabledCommands` if no group has an enabled command.
    pub fn run_grouped(&self) -> Result<(), NavError> {
        loop {
            let groups = self.visible_groups();
            if groups.is_empty() {
                return Err(NavError::NoEnabledCommands);
            }
            let options: Vec<String> = groups.iter().map(|group| group.name.clone()).collect();
            let Some(choice) = self.choose(&options, &self.config.menu.prompt)? else {
                info!("Group menu cancelled");
                return Ok(());
            };
            let Some(group) = groups.iter().find(|group| group.name == choice) else {
                self.unknown_selection(&choice);
                continue;
            };
            match self.run_module_menu_with_back(group)? {
                MenuExit::Back => debug!("Back to group list"),
                MenuExit::Done => return Ok(()),
            }
        }
    }

    /// Open a group's module list directly, without a way back.
    ///
    /// # Errors
    ///
    /// Returns `NavError::UnknownGroup` listing the configured groups if `query`
    /// matches none of them.
    pub fn run_group(&self, query: &str) -> Result<(), NavError> {
        let group = self
            .config
            .group(query)
            .ok_or_else(|| NavError::UnknownGroup {
                requested: query.to_string(),
                available: self.available_groups(),
            })?;
        self.run_module_menu_direct(group)
    }

    /// Run one command with command-line arguments, skipping all menus.
    ///
    /// # Errors
    ///
    /// Returns `NavError::UnknownCommand` or `NavError::Disabled`.
    pub fn run_direct(&self, name: &str, args: Vec<String>) -> Result<CommandResult, NavError> {
        let command = self
            .registry
            .get(name)
            .ok_or_else(|| NavError::UnknownCommand(name.to_string()))?;
        if !self.config.is_enabled(command.name) {
            return Err(NavError::Disabled(name.to_string()));
        }
        Ok(self.execute(command, args))
    }

    fn run_module_menu_with_back(&self, group: &ModuleGroup) -> Result<MenuExit, NavError> {
        self.module_menu(group, true)
    }

    fn run_module_menu_direct(&self, group: &ModuleGroup) -> Result<(), NavError> {
        self.module_menu(group, false).map(|_| ())
    }

    fn module_menu(&self, group: &ModuleGroup, with_back: bool) -> Result<MenuExit, NavError> {
        let commands = self.group_commands(group);
        if commands.is_empty() {
            return Err(NavError::EmptyGroup(group.key.clone()));
        }
        let mut options = Vec::with_capacity(commands.len() + 1);
        if with_back {
            options.push(BACK.to_string());
        }
        options.extend(descriptions(&commands));

        loop {
            let Some(choice) = self.choose(&options, &group.name)? else {
                info!("Module menu for '{}' cancelled", group.key);
                return Ok(MenuExit::Done);
            };
            if with_back && choice == BACK {
                return Ok(MenuExit::Back);
            }
            let Some(command) = find_command(&commands, &choice) else {
                self.unknown_selection(&choice);
                continue;
            };
            match self.execute(command, Vec::new()) {
                CommandResult::Back => debug!("'{}' went back, showing '{}' again", command.name, group.key),
                CommandResult::Success | CommandResult::Cancelled | CommandResult::Failed(_) => {
                    return Ok(MenuExit::Done);
                }
            }
        }
    }

    fn execute(&self, command: &Command, args: Vec<String>) -> CommandResult {
        info!("Running '{}' (args: {args:?})", command.name);
        let context = AppContext::new(self.launcher, self.config, self.notifier, args);
        let result = (command.run)(&context);
        match &result {
            CommandResult::Failed(reason) => warn!("'{}' failed: {reason}", command.name),
            other => debug!("'{}' finished: {other:?}", command.name),
        }
        result
    }

    /// Show a menu, mapping cancellation to `None`.
    fn choose(&self, options: &[String], prompt: &str) -> Result<Option<String>, NavError> {
        match self.launcher.show(options, prompt) {
            Ok(choice) => Ok(Some(choice)),
            Err(LauncherError::Cancelled) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn unknown_selection(&self, choice: &str) {
        warn!("Selection '{choice}' does not match any entry");
        self.notifier
            .error("ql", &format!("Unknown selection: {choice}"));
    }

    fn available_groups(&self) -> String {
        self.config
            .groups
            .iter()
            .map(|group| format!("{} ({})", group.key, group.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn descriptions(commands: &[&Command]) -> Vec<String> {
    commands
        .iter()
        .map(|command| command.description.to_string())
        .collect()
}

/// First command whose label matches; duplicate labels shadow later commands.
fn find_command<'c>(commands: &[&'c Command], description: &str) -> Option<&'c Command> {
    commands
        .iter()
        .find(|command| command.description == description)
        .copied()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use toml::{Table, Value};

    use super::*;
    use crate::commands::context::Context;
    use crate::config_file::MenuConfig;
    use crate::notify::Urgency;

    /// Replays canned answers and records every menu it was asked to show.
    #[derive(Default)]
    struct ScriptedLauncher {
        answers: RefCell<VecDeque<String>>,
        shown: RefCell<Vec<(Vec<String>, String)>>,
    }

    impl ScriptedLauncher {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().map(ToString::to_string).collect()),
                shown: RefCell::default(),
            }
        }

        fn shown(&self) -> Vec<Vec<String>> {
            self.shown.borrow().iter().map(|(o, _)| o.clone()).collect()
        }
    }

    impl Launcher for ScriptedLauncher {
        fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError> {
            self.shown
                .borrow_mut()
                .push((options.to_vec(), prompt.to_string()));
            // Running out of answers behaves like pressing escape
            self.answers
                .borrow_mut()
                .pop_front()
                .ok_or(LauncherError::Cancelled)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _urgency: Urgency, summary: &str, body: &str) {
            self.sent.borrow_mut().push(format!("{summary}: {body}"));
        }
    }

    fn succeed(_: &dyn Context) -> CommandResult {
        CommandResult::Success
    }

    /// A module with its own submenu honoring the back convention
    fn with_submenu(ctx: &dyn Context) -> CommandResult {
        let options = vec![BACK.to_string(), "Do it".to_string()];
        match ctx.show(&options, "sub") {
            Ok(choice) if choice == BACK => CommandResult::Back,
            Ok(_) => CommandResult::Success,
            Err(_) => CommandResult::Cancelled,
        }
    }

    fn registry() -> Registry {
        Registry::from_commands([
            Command::new("power", "Power", with_submenu),
            Command::new("kill", "Kill process", succeed),
            Command::new("weather", "Weather", succeed),
        ])
        .unwrap()
    }

    fn group(key: &str, name: &str, modules: &[&str]) -> ModuleGroup {
        ModuleGroup {
            key: key.to_string(),
            name: name.to_string(),
            enabled: true,
            modules: modules.iter().map(ToString::to_string).collect(),
        }
    }

    fn config(order: &[&str], groups: Vec<ModuleGroup>) -> Config {
        Config {
            menu: MenuConfig {
                module_order: order.iter().map(ToString::to_string).collect(),
                ..MenuConfig::default()
            },
            groups,
            ..Config::default()
        }
    }

    fn set_enabled(config: &mut Config, module: &str, value: Value) {
        let mut section = Table::new();
        section.insert("enabled".to_string(), value);
        config.commands.insert(module.to_string(), section);
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_flat_follows_module_order() {
        let registry = Registry::from_commands([
            Command::new("power", "Power", succeed),
            Command::new("weather", "Weather", succeed),
        ])
        .unwrap();
        let config = config(&["weather", "power"], Vec::new());
        let launcher = ScriptedLauncher::new(&["Weather"]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        assert_eq!(launcher.shown(), vec![strings(&["Weather", "Power"])]);
    }

    #[test]
    fn test_flat_ends_after_one_command() {
        let registry = registry();
        let config = config(&[], Vec::new());
        // "Do it" answers the submenu; a looping menu would ask again
        let launcher = ScriptedLauncher::new(&["Power", "Do it", "Weather"]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        assert_eq!(launcher.shown().len(), 2);
    }

    #[test]
    fn test_unregistered_names_are_dropped() {
        let registry = registry();
        let config = config(&["ghost", "weather"], Vec::new());
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        assert_eq!(
            launcher.shown(),
            vec![strings(&["Weather", "Power", "Kill process"])]
        );
    }

    #[test]
    fn test_option_list_is_stable() {
        let registry = registry();
        let config = config(&["kill", "power"], Vec::new());
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        nav.run_flat().unwrap();
        let shown = launcher.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0], shown[1]);
    }

    #[test]
    fn test_enabled_flag_resolution() {
        let registry = registry();
        let mut config = config(&[], Vec::new());
        set_enabled(&mut config, "power", Value::String("yes".to_string()));
        set_enabled(&mut config, "kill", Value::Boolean(false));
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        assert_eq!(launcher.shown(), vec![strings(&["Power", "Weather"])]);
    }

    #[test]
    fn test_nothing_enabled_skips_launcher() {
        let registry = registry();
        let mut config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        set_enabled(&mut config, "power", Value::Boolean(false));
        set_enabled(&mut config, "kill", Value::Boolean(false));
        set_enabled(&mut config, "weather", Value::Boolean(false));
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        assert!(matches!(nav.run_flat(), Err(NavError::NoEnabledCommands)));
        assert!(matches!(nav.run_grouped(), Err(NavError::NoEnabledCommands)));
        match nav.run_group("system") {
            Err(NavError::EmptyGroup(key)) => assert_eq!(key, "system"),
            other => panic!("Expected EmptyGroup, got: {other:?}"),
        }
        assert!(launcher.shown().is_empty());
    }

    #[test]
    fn test_back_returns_to_group_list() {
        let registry = registry();
        let config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        let launcher = ScriptedLauncher::new(&["System", BACK]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_grouped().unwrap();
        assert_eq!(
            launcher.shown(),
            vec![
                strings(&["System"]),
                strings(&[BACK, "Power", "Kill process"]),
                strings(&["System"]),
            ]
        );
    }

    #[test]
    fn test_module_back_reshows_module_list() {
        let registry = registry();
        let config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        let launcher = ScriptedLauncher::new(&["System", "Power", BACK]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_grouped().unwrap();
        let shown = launcher.shown();
        assert_eq!(shown.len(), 4);
        assert_eq!(shown[2], strings(&[BACK, "Do it"]));
        assert_eq!(shown[3], strings(&[BACK, "Power", "Kill process"]));
    }

    #[test]
    fn test_cancel_in_group_exits() {
        let registry = registry();
        let config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        let launcher = ScriptedLauncher::new(&["System"]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_grouped().unwrap();
        assert_eq!(launcher.shown().len(), 2);
    }

    #[test]
    fn test_success_in_group_exits() {
        let registry = registry();
        let config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        let launcher = ScriptedLauncher::new(&["System", "Kill process", "System"]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_grouped().unwrap();
        assert_eq!(launcher.shown().len(), 2);
    }

    #[test]
    fn test_groups_without_enabled_modules_are_hidden() {
        let registry = registry();
        let mut disabled = group("media", "Media", &["weather"]);
        disabled.enabled = false;
        let config = config(
            &[],
            vec![
                group("system", "System", &["power"]),
                group("ghosts", "Ghosts", &["ghost"]),
                disabled,
            ],
        );
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_grouped().unwrap();
        assert_eq!(launcher.shown(), vec![strings(&["System"])]);
    }

    #[test]
    fn test_direct_group_has_no_back_entry() {
        let registry = registry();
        let config = config(&[], vec![group("system", "System", &["power", "kill"])]);
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run(MenuStyle::Grouped, Some("System")).unwrap();
        assert_eq!(launcher.shown(), vec![strings(&["Power", "Kill process"])]);
    }

    #[test]
    fn test_unknown_group_lists_available_groups() {
        let registry = registry();
        let config = config(
            &[],
            vec![
                group("system", "System", &["power"]),
                group("network", "Network", &["weather"]),
            ],
        );
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        let err = nav.run_group("doesnotexist").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unknown group 'doesnotexist'; available groups: system (System), network (Network)");
        assert!(launcher.shown().is_empty());
    }

    #[test]
    fn test_unknown_selection_is_reported_and_reshown() {
        let registry = registry();
        let config = config(&[], Vec::new());
        let launcher = ScriptedLauncher::new(&["Typed text", "Weather"]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        nav.run_flat().unwrap();
        assert_eq!(launcher.shown().len(), 2);
        assert_eq!(
            *notifier.sent.borrow(),
            vec!["ql: Unknown selection: Typed text".to_string()]
        );
    }

    #[test]
    fn test_direct_launch() {
        let registry = registry();
        let mut config = config(&[], Vec::new());
        set_enabled(&mut config, "kill", Value::Boolean(false));
        let launcher = ScriptedLauncher::new(&[]);
        let notifier = RecordingNotifier::default();
        let nav = Navigator::new(&registry, &config, &launcher, &notifier);

        assert_eq!(
            nav.run_direct("weather", vec!["Berlin".to_string()]).unwrap(),
            CommandResult::Success
        );
        assert!(matches!(
            nav.run_direct("kill", Vec::new()),
            Err(NavError::Disabled(_))
        ));
        assert!(matches!(
            nav.run_direct("nope", Vec::new()),
            Err(NavError::UnknownCommand(_))
        ));
    }
}
