//! Configuration file handling for ql

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::{Table, Value};

use crate::commands::group::ModuleGroup;

/// Configuration shipped with the binary, written out by `ql --init`
pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

const CONFIG_DIR: &str = "ql";
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while loading or writing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to determine the user config directory")]
    NoConfigDir,
    #[error("Unable to read config file {path}: {source}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unable to parse TOML config file {path}: {source}")]
    Toml {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("Config file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("Unable to write config file {path}: {source}")]
    Write {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Duplicate group key in config: {0}")]
    DuplicateGroup(String),
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// How the top-level menu is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuStyle {
    Flat,
    #[default]
    Grouped,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub name: String,
    /// Extra arguments keyed by launcher name
    pub args: BTreeMap<String, Vec<String>>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            name: "rofi".to_string(),
            args: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuConfig {
    pub style: MenuStyle,
    pub prompt: String,
    pub module_order: Vec<String>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            style: MenuStyle::default(),
            prompt: "ql".to_string(),
            module_order: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub app_name: String,
    pub timeout_ms: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "ql".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Root configuration structure for ql
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub launcher: LauncherConfig,
    pub menu: MenuConfig,
    pub notifications: NotificationConfig,
    pub groups: Vec<ModuleGroup>,
    /// Per-module sections, decoded by each module on its own
    pub commands: BTreeMap<String, Table>,
}

impl Config {
    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` if the embedded file does not parse.
    pub fn embedded() -> Result<Config, ConfigError> {
        let table = parse_table(DEFAULT_CONFIG, Path::new("<embedded>"))?;
        into_config(table, Path::new("<embedded>"))
    }

    /// Location of the user config file (`$XDG_CONFIG_HOME/ql/config.toml`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads a config file and merges it over the embedded defaults.
    ///
    /// A missing file yields the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file exists but cannot be read, or
    /// `ConfigError::Toml` if it does not parse into a config.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        if !file.exists() {
            debug!("No config file at {}, using defaults", file.display());
            return Config::embedded();
        }
        let contents = std::fs::read_to_string(file).map_err(|e| ConfigError::Read {
            source: e,
            path: file.to_path_buf(),
        })?;
        info!("Loaded config file: {}", file.display());
        Config::from_str_merged(&contents, file)
    }

    /// Parses `contents` and merges it over the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` if either document does not parse.
    pub fn from_str_merged(contents: &str, path: &Path) -> Result<Config, ConfigError> {
        let mut base = parse_table(DEFAULT_CONFIG, Path::new("<embedded>"))?;
        let user = parse_table(contents, path)?;
        merge_tables(&mut base, user);
        into_config(base, path)
    }

    /// Writes the embedded default configuration to `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AlreadyExists` if the file exists and `force` is not set,
    /// or `ConfigError::Write` on I/O failure.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let write_err = |e| ConfigError::Write {
            source: e,
            path: path.to_path_buf(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, DEFAULT_CONFIG).map_err(write_err)?;
        Ok(())
    }

    /// Whether the module is enabled. Anything other than a boolean `enabled`
    /// key counts as enabled.
    #[must_use]
    pub fn is_enabled(&self, module: &str) -> bool {
        self.commands
            .get(module)
            .and_then(|section| section.get("enabled"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Decodes a module's section, falling back to `T::default()` when the
    /// section is missing or malformed.
    #[must_use]
    pub fn module<T: DeserializeOwned + Default>(&self, module: &str) -> T {
        let Some(section) = self.commands.get(module) else {
            return T::default();
        };
        match Value::Table(section.clone()).try_into() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Ignoring malformed [commands.{module}] section: {e}");
                T::default()
            }
        }
    }

    /// Find a group by key or display name
    #[must_use]
    pub fn group(&self, query: &str) -> Option<&ModuleGroup> {
        self.groups.iter().find(|group| group.matches(query))
    }

    /// Extra arguments configured for a launcher
    #[must_use]
    pub fn launcher_args(&self, launcher: &str) -> &[String] {
        self.launcher.args.get(launcher).map_or(&[], Vec::as_slice)
    }
}

fn parse_table(contents: &str, path: &Path) -> Result<Table, ConfigError> {
    contents.parse::<Table>().map_err(|e| ConfigError::Toml {
        source: e,
        path: path.to_path_buf(),
    })
}

fn into_config(table: Table, path: &Path) -> Result<Config, ConfigError> {
    Value::Table(table)
        .try_into()
        .map_err(|e| ConfigError::Toml {
            source: e,
            path: path.to_path_buf(),
        })
}

/// Merge `overlay` into `base`: tables merge recursively, other values replace.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
