use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use cmdkit_core::{CommandsetRegistry, Storage, AUXILIARY_COMMANDSET, PRIMARY_WORKFLOW};

use crate::ProjectLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MergeStrategy {
    Skip,
    Overwrite,
    Merge,
    NewerVersion,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Merge => "merge",
            Self::NewerVersion => "newer-version",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skip" => Some(Self::Skip),
            "overwrite" => Some(Self::Overwrite),
            "merge" => Some(Self::Merge),
            "newer-version" => Some(Self::NewerVersion),
            _ => None,
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsConflict {
    pub path: String,
    pub commandsets: Vec<String>,
    pub recommended_strategy: MergeStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsValidation {
    pub existing: Vec<String>,
    pub missing: Vec<String>,
    pub valid: bool,
}

/// Strategy for a shared path, from its shape. First match wins: a `rules`
/// segment, then a `templates` segment, then a `.json` suffix.
pub fn recommend_strategy(path: &str) -> MergeStrategy {
    let has_segment = |segment: &str| {
        Path::new(path)
            .components()
            .any(|component| component.as_os_str() == segment)
    };

    if has_segment("rules") {
        MergeStrategy::Skip
    } else if has_segment("templates") {
        MergeStrategy::NewerVersion
    } else if path.ends_with(".json") {
        MergeStrategy::Merge
    } else {
        MergeStrategy::NewerVersion
    }
}

pub struct SettingsFileManager {
    registry: Arc<CommandsetRegistry>,
    storage: Arc<dyn Storage>,
}

impl SettingsFileManager {
    pub fn new(registry: Arc<CommandsetRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self { registry, storage }
    }

    /// Settings paths declared by more than one of `commandsets`, sorted by path.
    pub fn detect_conflicts<S: AsRef<str>>(&self, commandsets: &[S]) -> Vec<SettingsConflict> {
        let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut seen = BTreeSet::new();
        for name in commandsets.iter().map(AsRef::as_ref) {
            if !seen.insert(name) {
                continue;
            }
            let Some(definition) = self.registry.definition(name) else {
                continue;
            };
            for path in &definition.settings {
                let entry = owners.entry(path.clone()).or_default();
                if !entry.iter().any(|owner| owner == name) {
                    entry.push(name.to_string());
                }
            }
        }

        owners
            .into_iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(path, commandsets)| SettingsConflict {
                recommended_strategy: recommend_strategy(&path),
                path,
                commandsets,
            })
            .collect()
    }

    /// Classifies each conflicting file as merged or skipped. No file is read
    /// or written.
    pub fn merge_settings(
        &self,
        conflicts: &[SettingsConflict],
        strategy: MergeStrategy,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for conflict in conflicts {
            let effective = match strategy {
                MergeStrategy::NewerVersion => conflict.recommended_strategy,
                requested => requested,
            };
            match effective {
                MergeStrategy::Skip => outcome.skipped.push(conflict.path.clone()),
                _ => outcome.merged.push(conflict.path.clone()),
            }
        }
        outcome
    }

    pub fn validate_settings(&self, layout: &ProjectLayout) -> SettingsValidation {
        let mut existing = Vec::new();
        let mut missing = Vec::new();
        for path in self.get_required_files(&[PRIMARY_WORKFLOW, AUXILIARY_COMMANDSET]) {
            if self.storage.exists(&layout.resolve(&path)) {
                existing.push(path);
            } else {
                missing.push(path);
            }
        }

        SettingsValidation {
            valid: missing.is_empty(),
            existing,
            missing,
        }
    }

    /// Deduplicated union of declared settings files, in first-seen order.
    pub fn get_required_files<S: AsRef<str>>(&self, commandsets: &[S]) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();
        for name in commandsets.iter().map(AsRef::as_ref) {
            let Some(definition) = self.registry.definition(name) else {
                continue;
            };
            for path in &definition.settings {
                if seen.insert(path.as_str()) {
                    files.push(path.clone());
                }
            }
        }
        files
    }
}
