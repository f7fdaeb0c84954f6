use crate::config_file::Config;
use crate::launcher::{Launcher, LauncherError};
use crate::notify::Notifier;

/// Capabilities handed to a command when it runs.
pub trait Context {
    /// Show `options` in the menu program and return the chosen (or typed) line.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::Cancelled` when the user dismisses the menu.
    fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError>;

    fn config(&self) -> &Config;

    /// Arguments given on the command line after the module name.
    fn args(&self) -> &[String];

    fn notifier(&self) -> &dyn Notifier;

    fn is_direct_launch(&self) -> bool {
        !self.args().is_empty()
    }
}

/// A view over the chosen launcher and the loaded configuration.
pub struct AppContext<'a> {
    launcher: &'a dyn Launcher,
    config: &'a Config,
    notifier: &'a dyn Notifier,
    args: Vec<String>,
}

impl<'a> AppContext<'a> {
    #[must_use]
    pub fn new(
        launcher: &'a dyn Launcher,
        config: &'a Config,
        notifier: &'a dyn Notifier,
        args: Vec<String>,
    ) -> Self {
        Self {
            launcher,
            config,
            notifier,
            args,
        }
    }
}

impl Context for AppContext<'_> {
    fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError> {
        self.launcher.show(options, prompt)
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn notifier(&self) -> &dyn Notifier {
        self.notifier
    }
}
