use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use cmdkit_core::{CommandsetError, CommandsetRegistry, Result, Storage, PRIMARY_WORKFLOW};
use cmdkit_resolver::resolve_install_order;

use crate::project_config::record_installed_version;
use crate::{
    BatchInstallReport, BundleLayout, CommandsetFailure, CommandsetInstallOutcome,
    CommandsetInstallStatus, CommandsetInstaller, CommandsetVersionService, InstallContext,
    InstallOptions, InstallResult, InstallStatusReport, ProfileManager, ProjectLayout,
    RollbackManager, SettingsFileManager, TemplateInstaller,
};

/// Share of the primary workflow's files that counts as a usable setup.
const MINIMAL_SETUP_THRESHOLD_PERCENT: usize = 80;

/// Progress hook: `(current, total, commandset)`, with `current` starting at 1.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// Entry point for installs. Owns one instance of every collaborator; build
/// one per process and pass it to whoever needs it.
pub struct UnifiedCommandsetInstaller {
    registry: Arc<CommandsetRegistry>,
    storage: Arc<dyn Storage>,
    bundle: BundleLayout,
    installers: BTreeMap<String, Box<dyn CommandsetInstaller>>,
    default_installer: TemplateInstaller,
    profiles: ProfileManager,
    settings: SettingsFileManager,
    versions: CommandsetVersionService,
    rollback: RollbackManager,
}

impl UnifiedCommandsetInstaller {
    pub fn new(
        registry: Arc<CommandsetRegistry>,
        storage: Arc<dyn Storage>,
        bundle_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            profiles: ProfileManager::new(registry.clone(), storage.clone()),
            settings: SettingsFileManager::new(registry.clone(), storage.clone()),
            versions: CommandsetVersionService::new(registry.clone(), storage.clone()),
            rollback: RollbackManager::new(registry.clone(), storage.clone()),
            bundle: BundleLayout::new(bundle_root),
            installers: BTreeMap::new(),
            default_installer: TemplateInstaller,
            registry,
            storage,
        }
    }

    /// Routes `name` to a dedicated installer instead of the template copier.
    pub fn with_installer(
        mut self,
        name: impl Into<String>,
        installer: impl CommandsetInstaller + 'static,
    ) -> Self {
        self.installers.insert(name.into(), Box::new(installer));
        self
    }

    pub fn registry(&self) -> &CommandsetRegistry {
        &self.registry
    }

    pub fn profiles(&self) -> &ProfileManager {
        &self.profiles
    }

    pub fn settings(&self) -> &SettingsFileManager {
        &self.settings
    }

    pub fn versions(&self) -> &CommandsetVersionService {
        &self.versions
    }

    pub fn rollback(&self) -> &RollbackManager {
        &self.rollback
    }

    pub fn install_commandset(
        &self,
        layout: &ProjectLayout,
        name: &str,
        options: InstallOptions,
    ) -> Result<InstallResult> {
        let definition =
            self.registry
                .definition(name)
                .ok_or_else(|| CommandsetError::UnknownCommandset {
                    name: name.to_string(),
                })?;
        let installer: &dyn CommandsetInstaller = match self.installers.get(name) {
            Some(installer) => installer.as_ref(),
            None => &self.default_installer,
        };

        let ctx = InstallContext {
            layout,
            bundle: &self.bundle,
            storage: self.storage.as_ref(),
            options,
        };
        let result = InstallResult::from_breakdown(installer.install(definition, &ctx)?);

        if !options.dry_run && result.is_clean() {
            if let Err(err) = record_installed_version(
                self.storage.as_ref(),
                layout,
                name,
                &definition.version,
                Utc::now(),
            ) {
                tracing::warn!(commandset = name, error = %err, "files installed but version was not recorded");
            }
        }

        tracing::info!(
            commandset = name,
            installed = result.installed.len(),
            skipped = result.skipped.len(),
            overwritten = result.overwritten.len(),
            failed = result.failed.len(),
            dry_run = options.dry_run,
            "installed commandset"
        );
        Ok(result)
    }

    pub fn install_by_profile(
        &self,
        layout: &ProjectLayout,
        profile_name: &str,
        options: InstallOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<BatchInstallReport> {
        let profile = self.profiles.resolve_profile(layout, profile_name);
        self.install_commandsets(layout, &profile.commandsets, options, progress)
    }

    pub fn install_all(
        &self,
        layout: &ProjectLayout,
        options: InstallOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<BatchInstallReport> {
        let names = self.registry.names().collect::<Vec<_>>();
        self.install_commandsets(layout, &names, options, progress)
    }

    /// Validates and orders `names`, snapshots the project, then installs each
    /// commandset in order. Errors before the first copy leave the project
    /// untouched; a failing commandset after that does not stop the batch.
    pub fn install_commandsets<S: AsRef<str>>(
        &self,
        layout: &ProjectLayout,
        names: &[S],
        options: InstallOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<BatchInstallReport> {
        if let Some(unknown) = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !self.registry.contains(name))
        {
            return Err(CommandsetError::UnknownCommandset {
                name: unknown.to_string(),
            });
        }
        let order = resolve_install_order(self.registry.as_ref(), names)?;

        let conflicts = self.settings.detect_conflicts(&order);
        for conflict in &conflicts {
            tracing::debug!(
                path = %conflict.path,
                owners = ?conflict.commandsets,
                strategy = %conflict.recommended_strategy,
                "shared settings file"
            );
        }

        let backup_id = if options.dry_run || options.skip_backup {
            None
        } else {
            Some(self.rollback.create_backup(layout, &order)?.id)
        };

        let mut report = BatchInstallReport {
            order: order.clone(),
            backup_id,
            conflicts,
            ..BatchInstallReport::default()
        };
        self.run_batch(layout, &order, options, progress, &mut report);
        Ok(report)
    }

    fn run_batch(
        &self,
        layout: &ProjectLayout,
        order: &[String],
        options: InstallOptions,
        progress: ProgressCallback<'_>,
        report: &mut BatchInstallReport,
    ) {
        let total = order.len();
        for (index, name) in order.iter().enumerate() {
            progress(index + 1, total, name);

            let result = match self.install_commandset(layout, name, options) {
                Ok(result) => result,
                Err(error) => {
                    tracing::warn!(commandset = %name, error = %error, "commandset install failed, continuing");
                    report.failures.push(CommandsetFailure {
                        name: name.clone(),
                        error,
                    });
                    InstallResult::default()
                }
            };

            report.total_installed += result.installed.len();
            report.total_skipped += result.skipped.len();
            report.total_overwritten += result.overwritten.len();
            report.results.push(CommandsetInstallOutcome {
                name: name.clone(),
                result,
            });
        }
    }

    pub fn check_all_install_status(&self, layout: &ProjectLayout) -> InstallStatusReport {
        let commandsets = self
            .registry
            .definitions()
            .map(|definition| {
                let (installed, missing): (Vec<_>, Vec<_>) = definition
                    .files()
                    .map(|file| file.path.to_string())
                    .partition(|path| self.storage.exists(&layout.resolve(path)));
                CommandsetInstallStatus {
                    name: definition.name.clone(),
                    installed,
                    missing,
                }
            })
            .collect::<Vec<_>>();

        let declared: usize = commandsets.iter().map(CommandsetInstallStatus::declared).sum();
        let installed: usize = commandsets.iter().map(|status| status.installed.len()).sum();
        let completeness_score = if declared == 0 {
            0
        } else {
            ((installed as f64 * 100.0) / declared as f64).round() as u8
        };

        let is_minimal_setup_complete = commandsets
            .iter()
            .find(|status| status.name == PRIMARY_WORKFLOW)
            .is_some_and(|status| {
                status.declared() > 0
                    && status.installed.len() * 100
                        >= status.declared() * MINIMAL_SETUP_THRESHOLD_PERCENT
            });

        InstallStatusReport {
            commandsets,
            completeness_score,
            is_minimal_setup_complete,
        }
    }
}
