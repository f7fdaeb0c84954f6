//! Menu programs that present a list of options and return the user's choice

use std::fmt;

use log::warn;
use thiserror::Error;

use crate::config_file::Config;

pub mod external;
pub mod prompt;

pub use external::ExternalLauncher;
pub use prompt::PromptLauncher;

#[derive(Error, Debug)]
pub enum LauncherError {
    /// The user dismissed the menu without choosing anything.
    #[error("cancelled")]
    Cancelled,
    #[error("menu program '{0}' not found in PATH")]
    NotFound(String),
    #[error("menu program '{program}' failed with exit code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("menu program I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LauncherError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LauncherError::Cancelled)
    }
}

/// Something that can show a menu and block until the user picks a line.
pub trait Launcher {
    /// Present `options` under `prompt` and return the selected line verbatim.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::Cancelled` when nothing was selected, or another
    /// variant when the menu program could not be run.
    fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError>;
}

/// Supported menu programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LauncherKind {
    #[default]
    Rofi,
    Dmenu,
    Fzf,
    Bemenu,
    Fuzzel,
    /// Built-in terminal list, no external program needed
    Prompt,
}

impl LauncherKind {
    pub const ALL: [LauncherKind; 6] = [
        LauncherKind::Rofi,
        LauncherKind::Dmenu,
        LauncherKind::Fzf,
        LauncherKind::Bemenu,
        LauncherKind::Fuzzel,
        LauncherKind::Prompt,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            LauncherKind::Rofi => "rofi",
            LauncherKind::Dmenu => "dmenu",
            LauncherKind::Fzf => "fzf",
            LauncherKind::Bemenu => "bemenu",
            LauncherKind::Fuzzel => "fuzzel",
            LauncherKind::Prompt => "prompt",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Resolve a launcher name, falling back to the default for unknown names.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!(
                "Unknown launcher '{name}', falling back to {}",
                LauncherKind::default()
            );
            LauncherKind::default()
        })
    }
}

impl fmt::Display for LauncherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construct the launcher for `kind` with any extra arguments from the config.
#[must_use]
pub fn build(kind: LauncherKind, config: &Config) -> Box<dyn Launcher> {
    match kind {
        LauncherKind::Prompt => Box::new(PromptLauncher),
        external => Box::new(ExternalLauncher::new(
            external,
            config.launcher_args(external.name()).to_vec(),
        )),
    }
}
