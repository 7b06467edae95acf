use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigPrefix;

/// Per-group settings, keyed by group name. Lookups fall back to the
/// lowercased name.
///
/// ```toml
/// [groups.auth]
/// logging = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupsConfig {
    pub groups: BTreeMap<String, GroupConfig>,
}

impl GroupsConfig {
    pub fn get(&self, name: &str) -> Option<&GroupConfig> {
        self.groups
            .get(name)
            .or_else(|| self.groups.get(&name.to_lowercase()))
    }
}

impl ConfigPrefix for GroupsConfig {
    const PREFIX: &'static str = "groups";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupConfig {
    pub logging: bool,
}
