use std::fmt;

use cmdkit_core::{CommandsetError, FileCategory};

use crate::SettingsConflict;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Replace files that already exist in the project.
    pub force: bool,
    /// Classify every file without writing anything.
    pub dry_run: bool,
    /// Do not snapshot the project before a batch install.
    pub skip_backup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFailureKind {
    SourceMissing,
    PermissionDenied,
    WriteFailed(String),
    ReadFailed(String),
    ChecksumMismatch,
}

impl fmt::Display for FileFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceMissing => f.write_str("template missing"),
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::WriteFailed(reason) => write!(f, "write failed: {reason}"),
            Self::ReadFailed(reason) => write!(f, "read failed: {reason}"),
            Self::ChecksumMismatch => f.write_str("checksum mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub kind: FileFailureKind,
}

/// Per-file audit for one category of one commandset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOutcome {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub overwritten: Vec<String>,
    pub failed: Vec<FileFailure>,
}

/// Diagnostic breakdown kept behind the flattened [`InstallResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Commands(FileOutcome),
    Agents(FileOutcome),
    Settings(FileOutcome),
}

impl CategoryOutcome {
    pub fn new(category: FileCategory, outcome: FileOutcome) -> Self {
        match category {
            FileCategory::Commands => Self::Commands(outcome),
            FileCategory::Agents => Self::Agents(outcome),
            FileCategory::Settings => Self::Settings(outcome),
        }
    }

    pub fn category(&self) -> FileCategory {
        match self {
            Self::Commands(_) => FileCategory::Commands,
            Self::Agents(_) => FileCategory::Agents,
            Self::Settings(_) => FileCategory::Settings,
        }
    }

    pub fn outcome(&self) -> &FileOutcome {
        match self {
            Self::Commands(outcome) | Self::Agents(outcome) | Self::Settings(outcome) => outcome,
        }
    }
}

/// Flattened contract every commandset installer is normalized into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallResult {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub overwritten: Vec<String>,
    pub failed: Vec<FileFailure>,
    pub breakdown: Vec<CategoryOutcome>,
}

impl InstallResult {
    pub fn from_breakdown(breakdown: Vec<CategoryOutcome>) -> Self {
        let mut result = Self::default();
        for category in &breakdown {
            let outcome = category.outcome();
            result.installed.extend(outcome.installed.iter().cloned());
            result.skipped.extend(outcome.skipped.iter().cloned());
            result.overwritten.extend(outcome.overwritten.iter().cloned());
            result.failed.extend(outcome.failed.iter().cloned());
        }
        result.breakdown = breakdown;
        result
    }

    pub fn category(&self, category: FileCategory) -> Option<&FileOutcome> {
        self.breakdown
            .iter()
            .find(|entry| entry.category() == category)
            .map(CategoryOutcome::outcome)
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct CommandsetInstallOutcome {
    pub name: String,
    pub result: InstallResult,
}

#[derive(Debug)]
pub struct CommandsetFailure {
    pub name: String,
    pub error: CommandsetError,
}

#[derive(Debug, Default)]
pub struct BatchInstallReport {
    pub order: Vec<String>,
    /// One entry per commandset in `order`; failed commandsets carry an empty result.
    pub results: Vec<CommandsetInstallOutcome>,
    pub failures: Vec<CommandsetFailure>,
    pub total_installed: usize,
    pub total_skipped: usize,
    pub total_overwritten: usize,
    pub backup_id: Option<String>,
    pub conflicts: Vec<SettingsConflict>,
}

impl BatchInstallReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsetInstallStatus {
    pub name: String,
    pub installed: Vec<String>,
    pub missing: Vec<String>,
}

impl CommandsetInstallStatus {
    pub fn declared(&self) -> usize {
        self.installed.len() + self.missing.len()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && !self.installed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStatusReport {
    pub commandsets: Vec<CommandsetInstallStatus>,
    /// `round(100 * installed / declared)` over every tracked commandset.
    pub completeness_score: u8,
    pub is_minimal_setup_complete: bool,
}
