use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// Named, ordered subset of modules shown together in grouped menus
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleGroup {
    pub key: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub modules: Vec<String>,
}

impl ModuleGroup {
    /// Whether `query` names this group, by key or by display name.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.key == query || self.name == query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_key_and_name() {
        let group = ModuleGroup {
            key: "system".to_string(),
            name: "System".to_string(),
            enabled: true,
            modules: vec!["power".to_string()],
        };
        assert!(group.matches("system"));
        assert!(group.matches("System"));
        assert!(!group.matches("media"));
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let group: ModuleGroup = toml::from_str("key = \"media\"\nname = \"Media\"\n").unwrap();
        assert!(group.enabled);
        assert!(group.modules.is_empty());
    }
}
