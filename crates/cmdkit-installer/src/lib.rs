mod fs_utils;
mod layout;
mod profiles;
mod project_config;
mod rollback;
mod settings;
mod template;
mod types;
mod unified;
mod versions;

pub use layout::{BundleLayout, ProjectLayout, MERGED_DOCUMENT};
pub use profiles::{Profile, ProfileManager, DEFAULT_PROFILE};
pub use project_config::{
    read_project_config, record_installed_version, InstalledCommandset, ProjectConfig,
};
pub use rollback::{HistoryEntry, RollbackManager, RollbackOutcome, MAX_HISTORY_ENTRIES};
pub use settings::{
    recommend_strategy, MergeOutcome, MergeStrategy, SettingsConflict, SettingsFileManager,
    SettingsValidation,
};
pub use template::{CommandsetInstaller, InstallContext, TemplateInstaller};
pub use types::{
    BatchInstallReport, CategoryOutcome, CommandsetFailure, CommandsetInstallOutcome,
    CommandsetInstallStatus, FileFailure, FileFailureKind, FileOutcome, InstallOptions,
    InstallResult, InstallStatusReport,
};
pub use unified::{ProgressCallback, UnifiedCommandsetInstaller};
pub use versions::{CommandsetVersionService, VersionCheckReport, VersionInfo};
