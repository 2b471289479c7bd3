use std::sync::Arc;

use cmdkit_core::{is_newer_version, is_valid_version, CommandsetRegistry, Storage};

use crate::project_config::read_project_config;
use crate::ProjectLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: String,
    pub bundle_version: String,
    pub installed_version: Option<String>,
    pub installed_at: Option<String>,
    pub update_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheckReport {
    pub commandsets: Vec<VersionInfo>,
    pub has_commandsets: bool,
    /// The project predates version tracking: nothing was ever recorded.
    pub legacy_project: bool,
    pub updates_available: bool,
}

pub struct CommandsetVersionService {
    registry: Arc<CommandsetRegistry>,
    storage: Arc<dyn Storage>,
}

impl CommandsetVersionService {
    pub fn new(registry: Arc<CommandsetRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self { registry, storage }
    }

    /// Computed fresh on every call.
    pub fn check_versions(&self, layout: &ProjectLayout) -> VersionCheckReport {
        let config = read_project_config(self.storage.as_ref(), layout);
        let has_commandsets = !config.commandsets.is_empty();

        let commandsets = self
            .registry
            .definitions()
            .map(|definition| {
                let recorded = config.commandsets.get(&definition.name);
                let installed_version = recorded.map(|record| record.version.clone());
                VersionInfo {
                    name: definition.name.clone(),
                    update_required: update_required(
                        installed_version.as_deref(),
                        &definition.version,
                    ),
                    bundle_version: definition.version.clone(),
                    installed_version,
                    installed_at: recorded.map(|record| record.installed_at.clone()),
                }
            })
            .collect::<Vec<_>>();

        VersionCheckReport {
            updates_available: commandsets.iter().any(|info| info.update_required),
            commandsets,
            has_commandsets,
            legacy_project: !has_commandsets,
        }
    }
}

fn update_required(installed: Option<&str>, bundle: &str) -> bool {
    match installed {
        None => false,
        Some(installed) if !is_valid_version(installed) => true,
        Some(installed) => is_newer_version(Some(installed), bundle),
    }
}
