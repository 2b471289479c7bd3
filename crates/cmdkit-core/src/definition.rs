use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandsetCategory {
    Workflow,
    Utility,
}

impl CommandsetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Utility => "utility",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "workflow" => Some(Self::Workflow),
            "utility" => Some(Self::Utility),
            _ => None,
        }
    }
}

/// Where a declared file lands in the project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Commands,
    Agents,
    Settings,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Agents => "agents",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredFile<'a> {
    pub category: FileCategory,
    pub path: &'a str,
}

/// Static metadata for one commandset. Category and version stay raw strings
/// so that a hand-written catalog can be validated instead of rejected at
/// parse time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandsetDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub settings: Vec<String>,
}

impl CommandsetDefinition {
    /// Stand-in returned for names the registry does not know.
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            category: CommandsetCategory::Utility.as_str().to_string(),
            version: "0.0.0".to_string(),
            dependencies: BTreeSet::new(),
            roots: Vec::new(),
            commands: Vec::new(),
            agents: Vec::new(),
            settings: Vec::new(),
        }
    }

    pub fn category_kind(&self) -> Option<CommandsetCategory> {
        CommandsetCategory::parse(&self.category)
    }

    pub fn files_in(&self, category: FileCategory) -> &[String] {
        match category {
            FileCategory::Commands => &self.commands,
            FileCategory::Agents => &self.agents,
            FileCategory::Settings => &self.settings,
        }
    }

    pub fn files(&self) -> impl Iterator<Item = DeclaredFile<'_>> {
        [
            FileCategory::Commands,
            FileCategory::Agents,
            FileCategory::Settings,
        ]
        .into_iter()
        .flat_map(move |category| {
            self.files_in(category)
                .iter()
                .map(move |path| DeclaredFile {
                    category,
                    path: path.as_str(),
                })
        })
    }

    pub fn file_count(&self) -> usize {
        self.commands.len() + self.agents.len() + self.settings.len()
    }

    /// Path roots a backup has to capture before this commandset is installed.
    ///
    /// Falls back to the parent directory of every declared file when the
    /// catalog does not list roots explicitly.
    pub fn owned_roots(&self) -> Vec<String> {
        if !self.roots.is_empty() {
            return self.roots.clone();
        }

        let mut roots = BTreeSet::new();
        for file in self.files() {
            if let Some(parent) = Path::new(file.path).parent() {
                if !parent.as_os_str().is_empty() {
                    roots.insert(parent.to_string_lossy().into_owned());
                }
            }
        }
        roots.into_iter().collect()
    }
}
