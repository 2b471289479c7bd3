use std::path::{Path, PathBuf};

/// Project-level document captured by every backup when it exists.
pub const MERGED_DOCUMENT: &str = "CLAUDE.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a project-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn merged_document_path(&self) -> PathBuf {
        self.root.join(MERGED_DOCUMENT)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".cmdkit")
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join("config.json")
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.state_dir().join("profiles.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("history.json")
    }

    /// Claimed with create-new semantics while the history index is rewritten.
    pub fn history_lock_path(&self) -> PathBuf {
        self.state_dir().join("history.lock")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir().join("backups")
    }

    pub fn backup_dir(&self, backup_id: &str) -> PathBuf {
        self.backups_dir().join(backup_id)
    }
}

/// Template source: `<root>/<commandset>/<project-relative path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    root: PathBuf,
}

impl BundleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn commandset_dir(&self, commandset: &str) -> PathBuf {
        self.root.join(commandset)
    }

    pub fn template_path(&self, commandset: &str, relative: &str) -> PathBuf {
        self.commandset_dir(commandset).join(relative)
    }
}
