use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = CommandsetError> = std::result::Result<T, E>;

/// Every failure the engine reports to a front end.
///
/// Validation and dependency variants are produced before any file is touched.
/// File-system variants carry the path that failed.
#[derive(Debug, Error)]
pub enum CommandsetError {
    #[error("invalid commandset definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("unknown commandset: {name}")]
    UnknownCommandset { name: String },

    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error(
        "commandset '{commandset}' depends on '{required}', which is not part of the requested set"
    )]
    MissingDependency {
        commandset: String,
        required: String,
    },

    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("template bundle for '{commandset}' not found at {}", path.display())]
    BundleNotFound { commandset: String, path: PathBuf },

    #[error("backup not found: {backup_id}")]
    BackupNotFound { backup_id: String },

    #[error("failed to create backup {backup_id}")]
    BackupFailed {
        backup_id: String,
        #[source]
        source: Box<CommandsetError>,
    },

    #[error("rollback of {backup_id} restored no files ({} failed)", failed.len())]
    RollbackFailed {
        backup_id: String,
        failed: Vec<String>,
    },

    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}")]
    Serialization {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl CommandsetError {
    /// Wraps an OS error for `path`, keeping permission failures distinguishable.
    pub fn io(context: &str, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.to_path_buf(),
                source,
            };
        }
        Self::Io {
            context: format!("{context}: {}", path.display()),
            source,
        }
    }

    pub fn serialization(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Serialization {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Stable machine-readable code for front ends.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDefinition { .. } => "INVALID_DEFINITION",
            Self::UnknownCommandset { .. } => "UNKNOWN_COMMANDSET",
            Self::InvalidProfile { .. } => "INVALID_PROFILE",
            Self::MissingDependency { .. } => "MISSING_DEPENDENCY",
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::BundleNotFound { .. } => "BUNDLE_NOT_FOUND",
            Self::BackupNotFound { .. } => "BACKUP_NOT_FOUND",
            Self::BackupFailed { .. } => "BACKUP_FAILED",
            Self::RollbackFailed { .. } => "ROLLBACK_FAILED",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::Io { .. } => "IO_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }
}

/// `with_context`-style helper for `io::Result`.
pub trait IoResultExt<T> {
    fn with_path(self, context: &str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, context: &str, path: &Path) -> Result<T> {
        self.map_err(|err| CommandsetError::io(context, path, err))
    }
}
