use std::collections::BTreeMap;

use crate::catalog::{builtin_catalog, parse_catalog};
use crate::version::{is_newer_version, is_valid_version};
use crate::{CommandsetDefinition, CommandsetError, Result};

/// The commandset every other workflow piece assumes is present.
pub const PRIMARY_WORKFLOW: &str = "cc-sdd";
/// Auxiliary commandset whose settings are required alongside the primary workflow.
pub const AUXILIARY_COMMANDSET: &str = "bug";

/// Immutable view of every known commandset definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsetRegistry {
    definitions: BTreeMap<String, CommandsetDefinition>,
}

impl CommandsetRegistry {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(builtin_catalog())
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        Self::from_definitions(parse_catalog(input)?)
    }

    pub fn from_definitions(definitions: Vec<CommandsetDefinition>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for definition in definitions {
            Self::validate_definition(&definition)?;
            if by_name.contains_key(&definition.name) {
                return Err(CommandsetError::InvalidDefinition {
                    reason: format!("duplicate commandset name '{}'", definition.name),
                });
            }
            by_name.insert(definition.name.clone(), definition);
        }

        Ok(Self {
            definitions: by_name,
        })
    }

    pub fn validate_definition(definition: &CommandsetDefinition) -> Result<()> {
        let reason = if definition.name.trim().is_empty() {
            Some("name must not be empty".to_string())
        } else if definition.description.trim().is_empty() {
            Some(format!("'{}' is missing a description", definition.name))
        } else if definition.category_kind().is_none() {
            Some(format!(
                "'{}' has unsupported category '{}' (expected workflow or utility)",
                definition.name, definition.category
            ))
        } else if !is_valid_version(&definition.version) {
            Some(format!(
                "'{}' has invalid version '{}' (expected MAJOR.MINOR.PATCH[-PRERELEASE])",
                definition.name, definition.version
            ))
        } else if definition.file_count() == 0 {
            Some(format!("'{}' declares no files", definition.name))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CommandsetError::InvalidDefinition { reason }),
            None => Ok(()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> Option<&CommandsetDefinition> {
        self.definitions.get(name)
    }

    /// Never fails: unknown names yield a `0.0.0` placeholder with no files.
    pub fn get_definition(&self, name: &str) -> CommandsetDefinition {
        self.definitions
            .get(name)
            .cloned()
            .unwrap_or_else(|| CommandsetDefinition::placeholder(name))
    }

    pub fn load_all_definitions(&self) -> BTreeMap<String, CommandsetDefinition> {
        self.definitions.clone()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CommandsetDefinition> {
        self.definitions.values()
    }

    pub fn get_version(&self, name: &str) -> String {
        self.get_definition(name).version
    }

    pub fn get_all_versions(&self) -> BTreeMap<String, String> {
        self.definitions
            .iter()
            .map(|(name, definition)| (name.clone(), definition.version.clone()))
            .collect()
    }

    pub fn is_newer_version(&self, installed: Option<&str>, bundle: &str) -> bool {
        is_newer_version(installed, bundle)
    }
}
