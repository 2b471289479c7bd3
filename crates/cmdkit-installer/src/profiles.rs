use std::collections::BTreeMap;
use std::sync::Arc;

use cmdkit_core::{CommandsetError, CommandsetRegistry, IoResultExt, Result, Storage};
use serde::{Deserialize, Serialize};

use crate::ProjectLayout;

pub const DEFAULT_PROFILE: &str = "minimal";

const BUILTIN_PROFILES: &[(&str, &str, &[&str])] = &[
    (
        "minimal",
        "Spec-driven development workflow only",
        &["cc-sdd"],
    ),
    (
        "standard",
        "Spec-driven workflow plus the bug workflow",
        &["cc-sdd", "bug"],
    ),
    (
        "full",
        "Every bundled commandset",
        &["cc-sdd", "cc-sdd-agent", "bug", "document-review"],
    ),
    (
        "agent",
        "Subagent-driven spec workflow",
        &["cc-sdd-agent"],
    ),
    ("bug-only", "Bug workflow only", &["bug"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub commandsets: Vec<String>,
    pub is_custom: bool,
}

impl Profile {
    pub fn custom(
        name: impl Into<String>,
        description: impl Into<String>,
        commandsets: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commandsets,
            is_custom: true,
        }
    }

    fn builtin((name, description, commandsets): (&str, &str, &[&str])) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            commandsets: commandsets.iter().map(|name| name.to_string()).collect(),
            is_custom: false,
        }
    }
}

/// On-disk shape of one custom profile; the store key is the profile name.
#[derive(Debug, Serialize, Deserialize)]
struct StoredProfile {
    #[serde(default)]
    description: String,
    commandsets: Vec<String>,
}

pub struct ProfileManager {
    registry: Arc<CommandsetRegistry>,
    storage: Arc<dyn Storage>,
}

impl ProfileManager {
    pub fn new(registry: Arc<CommandsetRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self { registry, storage }
    }

    pub fn list_profiles(&self) -> Vec<Profile> {
        BUILTIN_PROFILES.iter().copied().map(Profile::builtin).collect()
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        BUILTIN_PROFILES.iter().any(|(builtin, _, _)| *builtin == name)
    }

    /// Built-in profile by name. Unknown names fall back to [`DEFAULT_PROFILE`].
    pub fn get_profile(&self, name: &str) -> Profile {
        if let Some(entry) = BUILTIN_PROFILES
            .iter()
            .copied()
            .find(|(builtin, _, _)| *builtin == name)
        {
            return Profile::builtin(entry);
        }

        tracing::warn!(profile = name, fallback = DEFAULT_PROFILE, "unknown profile");
        self.default_profile()
    }

    pub fn get_commandsets_for_profile(&self, name: &str) -> Vec<String> {
        self.get_profile(name).commandsets
    }

    /// Built-ins first, then the project's custom profiles, then the default.
    pub fn resolve_profile(&self, layout: &ProjectLayout, name: &str) -> Profile {
        if self.is_builtin(name) {
            return self.get_profile(name);
        }
        if let Some(custom) = self.load_custom_profiles(layout).remove(name) {
            return custom;
        }
        self.get_profile(name)
    }

    pub fn validate_profile(&self, profile: &Profile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(invalid("profile name must not be empty"));
        }
        if profile.commandsets.is_empty() {
            return Err(invalid(format!(
                "profile '{}' selects no commandsets",
                profile.name
            )));
        }
        let unknown = profile
            .commandsets
            .iter()
            .filter(|name| !self.registry.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(invalid(format!(
                "profile '{}' references unknown commandset(s): {}",
                profile.name,
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    pub fn save_custom_profile(&self, layout: &ProjectLayout, profile: &Profile) -> Result<()> {
        if self.is_builtin(&profile.name) {
            return Err(invalid(format!(
                "'{}' is a built-in profile and cannot be overwritten",
                profile.name
            )));
        }
        self.validate_profile(profile)?;

        let mut store = self.read_store(layout);
        let stored = StoredProfile {
            description: profile.description.clone(),
            commandsets: profile.commandsets.clone(),
        };
        let value = serde_json::to_value(stored)
            .map_err(|err| CommandsetError::serialization("failed to encode profile", err))?;
        store.insert(profile.name.clone(), value);
        self.write_store(layout, &store)?;

        tracing::info!(profile = %profile.name, "saved custom profile");
        Ok(())
    }

    /// Never fails: a missing or unparseable store is empty and invalid
    /// entries are dropped.
    pub fn load_custom_profiles(&self, layout: &ProjectLayout) -> BTreeMap<String, Profile> {
        let mut profiles = BTreeMap::new();
        for (name, value) in self.read_store(layout) {
            let stored = match serde_json::from_value::<StoredProfile>(value) {
                Ok(stored) => stored,
                Err(err) => {
                    tracing::warn!(profile = %name, error = %err, "skipping malformed custom profile");
                    continue;
                }
            };
            if self.is_builtin(&name) {
                tracing::warn!(profile = %name, "skipping custom profile shadowing a built-in");
                continue;
            }

            let profile = Profile::custom(name.clone(), stored.description, stored.commandsets);
            if let Err(err) = self.validate_profile(&profile) {
                tracing::warn!(profile = %name, error = %err, "skipping invalid custom profile");
                continue;
            }
            profiles.insert(name, profile);
        }
        profiles
    }

    pub fn delete_custom_profile(&self, layout: &ProjectLayout, name: &str) -> Result<bool> {
        let mut store = self.read_store(layout);
        if store.remove(name).is_none() {
            return Ok(false);
        }
        self.write_store(layout, &store)?;
        Ok(true)
    }

    fn default_profile(&self) -> Profile {
        BUILTIN_PROFILES
            .iter()
            .copied()
            .find(|(name, _, _)| *name == DEFAULT_PROFILE)
            .map(Profile::builtin)
            .unwrap_or_else(|| Profile {
                name: DEFAULT_PROFILE.to_string(),
                description: String::new(),
                commandsets: Vec::new(),
                is_custom: false,
            })
    }

    fn read_store(&self, layout: &ProjectLayout) -> serde_json::Map<String, serde_json::Value> {
        let path = layout.profiles_path();
        if !self.storage.exists(&path) {
            return serde_json::Map::new();
        }

        let parsed = self
            .storage
            .read(&path)
            .map_err(|err| err.to_string())
            .and_then(|raw| serde_json::from_slice(&raw).map_err(|err| err.to_string()));
        match parsed {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable profile store");
                serde_json::Map::new()
            }
        }
    }

    fn write_store(
        &self,
        layout: &ProjectLayout,
        store: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let path = layout.profiles_path();
        let payload = serde_json::to_vec_pretty(store)
            .map_err(|err| CommandsetError::serialization("failed to encode profile store", err))?;
        self.storage
            .write(&path, &payload)
            .with_path("failed to write profile store", &path)
    }
}

fn invalid(reason: impl Into<String>) -> CommandsetError {
    CommandsetError::InvalidProfile {
        reason: reason.into(),
    }
}
