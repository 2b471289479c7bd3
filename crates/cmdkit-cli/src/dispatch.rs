use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cmdkit_core::{CommandsetRegistry, FsStorage, Storage};
use cmdkit_installer::{
    BatchInstallReport, InstallOptions, Profile, ProjectLayout, UnifiedCommandsetInstaller,
    DEFAULT_PROFILE,
};
use cmdkit_resolver::resolve_install_order;

use crate::format::{
    format_conflict_lines, format_history_lines, format_install_report_lines, format_list_lines,
    format_order_lines, format_profile_lines, format_rollback_lines,
    format_settings_validation_lines, format_status_lines, format_version_lines,
};
use crate::render::{render_status_line, TerminalRenderer};
use crate::{Cli, Commands};

const BUNDLE_ROOT_ENV: &str = "CMDKIT_BUNDLE_ROOT";

enum InstallSelection {
    Names(Vec<String>),
    Profile(String),
    All,
}

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let style = renderer.style();
    let registry = Arc::new(load_registry(cli.catalog.as_deref())?);
    let layout = ProjectLayout::new(resolve_project_root(cli.project)?);
    tracing::debug!(project = %layout.root().display(), "resolved project root");
    let open_installer = || -> Result<UnifiedCommandsetInstaller> {
        let bundle_root = match &cli.bundle_root {
            Some(root) => root.clone(),
            None => default_bundle_root()?,
        };
        let storage: Arc<dyn Storage> = Arc::new(FsStorage);
        Ok(UnifiedCommandsetInstaller::new(
            registry.clone(),
            storage,
            bundle_root,
        ))
    };

    match cli.command {
        Commands::List => {
            renderer.print_lines(&format_list_lines(&registry));
        }
        Commands::Profiles => {
            let installer = open_installer()?;
            let profiles = installer.profiles();
            renderer.print_lines(&format_profile_lines(
                &profiles.list_profiles(),
                &profiles.load_custom_profiles(&layout),
            ));
        }
        Commands::Order { names } => {
            let order = resolve_install_order(registry.as_ref(), &names)?;
            renderer.print_lines(&format_order_lines(&order));
        }
        Commands::Install {
            names,
            profile,
            all,
            force,
            dry_run,
            no_backup,
        } => {
            let selection = if all {
                InstallSelection::All
            } else if let Some(profile) = profile {
                InstallSelection::Profile(profile)
            } else if names.is_empty() {
                InstallSelection::Profile(DEFAULT_PROFILE.to_string())
            } else {
                InstallSelection::Names(names)
            };
            let options = InstallOptions {
                force,
                dry_run,
                skip_backup: no_backup,
            };

            let installer = open_installer()?;
            let report = run_install(&installer, &layout, renderer, selection, options)?;
            renderer.print_section("install");
            renderer.print_lines(&format_install_report_lines(&report, style, dry_run));
            if !report.is_success() {
                return Err(anyhow!(
                    "{} commandset(s) failed to install",
                    report.failure_count()
                ));
            }
        }
        Commands::Status => {
            let report = open_installer()?.check_all_install_status(&layout);
            renderer.print_lines(&format_status_lines(&report));
        }
        Commands::Conflicts { names } => {
            let conflicts = open_installer()?.settings().detect_conflicts(&names);
            renderer.print_lines(&format_conflict_lines(&conflicts));
        }
        Commands::Versions => {
            let report = open_installer()?.versions().check_versions(&layout);
            renderer.print_lines(&format_version_lines(&report));
        }
        Commands::History => {
            let entries = open_installer()?.rollback().get_history(&layout)?;
            renderer.print_lines(&format_history_lines(&entries));
        }
        Commands::Rollback { backup_id } => {
            let outcome = open_installer()?.rollback().rollback(&layout, &backup_id)?;
            renderer.print_lines(&format_rollback_lines(&outcome, style));
        }
        Commands::ValidateSettings => {
            let validation = open_installer()?.settings().validate_settings(&layout);
            renderer.print_lines(&format_settings_validation_lines(&validation, style));
            if !validation.valid {
                return Err(anyhow!("required settings files are missing"));
            }
        }
        Commands::ProfileSave {
            name,
            description,
            commandsets,
        } => {
            let profile = Profile::custom(name, description, commandsets);
            open_installer()?
                .profiles()
                .save_custom_profile(&layout, &profile)?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("saved profile {}", profile.name))
            );
        }
    }

    Ok(())
}

fn run_install(
    installer: &UnifiedCommandsetInstaller,
    layout: &ProjectLayout,
    renderer: TerminalRenderer,
    selection: InstallSelection,
    options: InstallOptions,
) -> Result<BatchInstallReport> {
    let mut progress = renderer.start_progress("install");
    let outcome = {
        let mut on_progress = |current: usize, total: usize, name: &str| {
            progress.advance(current as u64, total as u64, name);
        };
        match &selection {
            InstallSelection::Names(names) => {
                installer.install_commandsets(layout, names, options, &mut on_progress)
            }
            InstallSelection::Profile(profile) => {
                installer.install_by_profile(layout, profile, options, &mut on_progress)
            }
            InstallSelection::All => installer.install_all(layout, options, &mut on_progress),
        }
    };

    match outcome {
        Ok(report) => {
            progress.finish_success();
            Ok(report)
        }
        Err(err) => {
            progress.finish_abandon();
            Err(err.into())
        }
    }
}

fn load_registry(catalog: Option<&Path>) -> Result<CommandsetRegistry> {
    let Some(path) = catalog else {
        return Ok(CommandsetRegistry::builtin()?);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog: {}", path.display()))?;
    CommandsetRegistry::from_toml_str(&raw)
        .with_context(|| format!("invalid catalog: {}", path.display()))
}

fn resolve_project_root(project: Option<PathBuf>) -> Result<PathBuf> {
    match project {
        Some(project) => Ok(project),
        None => std::env::current_dir().context("failed to resolve current directory"),
    }
}

pub(crate) fn default_bundle_root() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os(BUNDLE_ROOT_ENV).filter(|root| !root.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve the template bundle root")?;
        return Ok(PathBuf::from(app_data).join("cmdkit").join("bundles"));
    }

    let home =
        std::env::var("HOME").context("HOME is not set; cannot resolve the template bundle root")?;
    Ok(PathBuf::from(home).join(".cmdkit").join("bundles"))
}
