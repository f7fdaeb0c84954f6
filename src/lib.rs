//! Core implementation of the ql quick launcher
//!
//! ql is a small desktop launcher that presents everyday actions (power
//! management, screenshots, recording, radio, clipboard, wifi, weather and more)
//! through an external menu program such as rofi, dmenu or fzf. Actions are
//! modules registered in an explicit registry, arranged into groups by a TOML
//! configuration file, and navigated with a "← Back" entry at every level.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, warn};

use crate::config_file::{Config, ConfigError};

pub mod commands;
pub mod config_file;
pub mod launcher;
pub mod logger;
pub mod modules;
pub mod navigation;
pub mod notify;
pub mod session;
pub mod tools;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load configuration from a file (or the default location), returning the
/// config and the path it was looked up at.
///
/// An explicit path must exist; a missing file at the default location yields
/// the embedded defaults.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config file is missing, the file cannot
/// be read or parsed, or the groups are invalid.
pub fn load_config(config_file: Option<&str>) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = PathBuf::from(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            config_path
        }
        None => Config::default_path()?,
    };
    debug!("Loading config from {}", config_path.display());
    let config = Config::from_file(&config_path)?;
    validate_groups(&config)?;
    Ok((config, config_path))
}

/// Validate group keys and names, warning about groups that cannot show anything
fn validate_groups(config: &Config) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for group in &config.groups {
        if group.key.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Group '{}' has an empty key",
                group.name
            )));
        }
        if group.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Group with key '{}' has an empty name",
                group.key
            )));
        }
        if !seen.insert(group.key.as_str()) {
            return Err(ConfigError::DuplicateGroup(group.key.clone()));
        }
        if group.modules.is_empty() {
            warn!("Group '{}' has no modules", group.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::group::ModuleGroup;

    fn make_group(key: &str, name: &str) -> ModuleGroup {
        ModuleGroup {
            key: key.to_string(),
            name: name.to_string(),
            enabled: true,
            modules: vec!["power".to_string()],
        }
    }

    #[test]
    fn test_duplicate_group_key_detection() {
        let config = Config {
            groups: vec![make_group("system", "System"), make_group("system", "Other")],
            ..Config::default()
        };
        match validate_groups(&config).unwrap_err() {
            ConfigError::DuplicateGroup(key) => assert_eq!(key, "system"),
            other => panic!("Expected DuplicateGroup, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_group_name_is_invalid() {
        let config = Config {
            groups: vec![make_group("system", "  ")],
            ..Config::default()
        };
        assert!(matches!(
            validate_groups(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_embedded_groups_are_valid() {
        let config = Config::embedded().unwrap();
        assert!(validate_groups(&config).is_ok());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let result = load_config(Some("/nonexistent/ql/config.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
