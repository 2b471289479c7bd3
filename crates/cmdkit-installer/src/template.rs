use cmdkit_core::{CommandsetDefinition, CommandsetError, FileCategory, Result, Storage};

use crate::fs_utils::write_failure_kind;
use crate::{
    BundleLayout, CategoryOutcome, FileFailure, FileFailureKind, FileOutcome, InstallOptions,
    ProjectLayout,
};

pub struct InstallContext<'a> {
    pub layout: &'a ProjectLayout,
    pub bundle: &'a BundleLayout,
    pub storage: &'a dyn Storage,
    pub options: InstallOptions,
}

/// Installs one commandset and reports what happened per category.
pub trait CommandsetInstaller: Send + Sync {
    fn install(
        &self,
        definition: &CommandsetDefinition,
        ctx: &InstallContext<'_>,
    ) -> Result<Vec<CategoryOutcome>>;
}

/// Mirrors declared files from the bundle into the project, one category at a
/// time. Categories a commandset does not declare produce no outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateInstaller;

impl CommandsetInstaller for TemplateInstaller {
    fn install(
        &self,
        definition: &CommandsetDefinition,
        ctx: &InstallContext<'_>,
    ) -> Result<Vec<CategoryOutcome>> {
        let bundle_dir = ctx.bundle.commandset_dir(&definition.name);
        if !ctx.storage.is_dir(&bundle_dir) {
            return Err(CommandsetError::BundleNotFound {
                commandset: definition.name.clone(),
                path: bundle_dir,
            });
        }

        let mut breakdown = Vec::new();
        for category in [
            FileCategory::Commands,
            FileCategory::Agents,
            FileCategory::Settings,
        ] {
            let files = definition.files_in(category);
            if files.is_empty() {
                continue;
            }
            let mut outcome = FileOutcome::default();
            for file in files {
                copy_template(&definition.name, file, ctx, &mut outcome);
            }
            breakdown.push(CategoryOutcome::new(category, outcome));
        }
        Ok(breakdown)
    }
}

/// Never aborts: every file ends up in exactly one list of `outcome`.
fn copy_template(
    commandset: &str,
    relative: &str,
    ctx: &InstallContext<'_>,
    outcome: &mut FileOutcome,
) {
    let source = ctx.bundle.template_path(commandset, relative);
    let destination = ctx.layout.resolve(relative);

    if !ctx.storage.exists(&source) {
        tracing::warn!(commandset, file = relative, "template missing from bundle");
        outcome.failed.push(FileFailure {
            path: relative.to_string(),
            kind: FileFailureKind::SourceMissing,
        });
        return;
    }

    let existed = ctx.storage.exists(&destination);
    if existed && !ctx.options.force {
        tracing::debug!(commandset, file = relative, "keeping existing file");
        outcome.skipped.push(relative.to_string());
        return;
    }

    if !ctx.options.dry_run {
        if let Err(err) = ctx.storage.copy(&source, &destination) {
            tracing::warn!(commandset, file = relative, error = %err, "failed to install file");
            outcome.failed.push(FileFailure {
                path: relative.to_string(),
                kind: write_failure_kind(&err),
            });
            return;
        }
    }

    if existed {
        tracing::debug!(commandset, file = relative, "overwrote file");
        outcome.overwritten.push(relative.to_string());
    } else {
        tracing::debug!(commandset, file = relative, "installed file");
        outcome.installed.push(relative.to_string());
    }
}
