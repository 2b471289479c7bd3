use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use cmdkit_core::{CommandsetError, IoResultExt, Result, Storage};
use serde::{Deserialize, Serialize};

use crate::ProjectLayout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "config_version")]
    pub version: u32,
    #[serde(default)]
    pub commandsets: BTreeMap<String, InstalledCommandset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledCommandset {
    pub version: String,
    pub installed_at: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: config_version(),
            commandsets: BTreeMap::new(),
        }
    }
}

fn config_version() -> u32 {
    1
}

/// Reads the project config. Missing or unparseable files read as empty.
pub fn read_project_config(storage: &dyn Storage, layout: &ProjectLayout) -> ProjectConfig {
    let path = layout.config_path();
    if !storage.exists(&path) {
        return ProjectConfig::default();
    }

    let parsed = storage
        .read(&path)
        .map_err(|err| err.to_string())
        .and_then(|raw| serde_json::from_slice(&raw).map_err(|err| err.to_string()));
    match parsed {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable project config");
            ProjectConfig::default()
        }
    }
}

pub fn record_installed_version(
    storage: &dyn Storage,
    layout: &ProjectLayout,
    name: &str,
    version: &str,
    installed_at: DateTime<Utc>,
) -> Result<()> {
    let mut config = read_project_config(storage, layout);
    config.commandsets.insert(
        name.to_string(),
        InstalledCommandset {
            version: version.to_string(),
            installed_at: installed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    );

    let path = layout.config_path();
    let payload = serde_json::to_vec_pretty(&config)
        .map_err(|err| CommandsetError::serialization("failed to encode project config", err))?;
    storage
        .write(&path, &payload)
        .with_path("failed to write project config", &path)
}
