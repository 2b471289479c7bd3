use std::collections::BTreeMap;

use cmdkit_core::CommandsetRegistry;
use cmdkit_installer::{
    BatchInstallReport, HistoryEntry, InstallResult, InstallStatusReport, Profile,
    RollbackOutcome, SettingsConflict, SettingsValidation, VersionCheckReport,
};

use crate::render::{render_status_line, OutputStyle};

pub(crate) fn format_list_lines(registry: &CommandsetRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for definition in registry.definitions() {
        lines.push(format!(
            "{} {} [{}] {}",
            definition.name, definition.version, definition.category, definition.description
        ));
        if !definition.dependencies.is_empty() {
            let dependencies = definition
                .dependencies
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>();
            lines.push(format!("  requires: {}", dependencies.join(", ")));
        }
    }
    lines
}

pub(crate) fn format_profile_lines(
    builtin: &[Profile],
    custom: &BTreeMap<String, Profile>,
) -> Vec<String> {
    builtin
        .iter()
        .chain(custom.values())
        .map(|profile| {
            let origin = if profile.is_custom { " (custom)" } else { "" };
            format!(
                "{}{}: {} [{}]",
                profile.name,
                origin,
                profile.description,
                profile.commandsets.join(", ")
            )
        })
        .collect()
}

pub(crate) fn format_order_lines(order: &[String]) -> Vec<String> {
    order
        .iter()
        .enumerate()
        .map(|(index, name)| format!("{}. {name}", index + 1))
        .collect()
}

fn summarize_result(result: &InstallResult) -> String {
    format!(
        "{} installed, {} skipped, {} overwritten, {} failed",
        result.installed.len(),
        result.skipped.len(),
        result.overwritten.len(),
        result.failed.len()
    )
}

pub(crate) fn format_install_report_lines(
    report: &BatchInstallReport,
    style: OutputStyle,
    dry_run: bool,
) -> Vec<String> {
    let mut lines = Vec::new();
    if dry_run {
        lines.push(render_status_line(
            style,
            "info",
            "dry run: no files were written",
        ));
    }

    for outcome in &report.results {
        if let Some(failure) = report
            .failures
            .iter()
            .find(|failure| failure.name == outcome.name)
        {
            lines.push(render_status_line(
                style,
                "error",
                &format!("{}: {}", failure.name, failure.error),
            ));
            continue;
        }

        let status = if outcome.result.is_clean() { "ok" } else { "warn" };
        lines.push(render_status_line(
            style,
            status,
            &format!("{}: {}", outcome.name, summarize_result(&outcome.result)),
        ));
        for failure in &outcome.result.failed {
            lines.push(format!("  {}: {}", failure.path, failure.kind));
        }
    }

    for conflict in &report.conflicts {
        lines.push(format!(
            "shared setting {} ({}): {}",
            conflict.path,
            conflict.commandsets.join(", "),
            conflict.recommended_strategy
        ));
    }
    if let Some(backup_id) = &report.backup_id {
        lines.push(format!("backup: {backup_id}"));
    }
    lines.push(format!(
        "total: {} installed, {} skipped, {} overwritten, {} commandset(s) failed",
        report.total_installed,
        report.total_skipped,
        report.total_overwritten,
        report.failure_count()
    ));
    lines
}

pub(crate) fn format_status_lines(report: &InstallStatusReport) -> Vec<String> {
    let mut lines = report
        .commandsets
        .iter()
        .map(|status| {
            format!(
                "{}: {}/{} files present",
                status.name,
                status.installed.len(),
                status.declared()
            )
        })
        .collect::<Vec<_>>();
    lines.push(format!("completeness: {}%", report.completeness_score));
    lines.push(format!(
        "minimal setup: {}",
        if report.is_minimal_setup_complete {
            "complete"
        } else {
            "incomplete"
        }
    ));
    lines
}

pub(crate) fn format_conflict_lines(conflicts: &[SettingsConflict]) -> Vec<String> {
    if conflicts.is_empty() {
        return vec!["no shared settings files".to_string()];
    }
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{} <- {} (recommended: {})",
                conflict.path,
                conflict.commandsets.join(", "),
                conflict.recommended_strategy
            )
        })
        .collect()
}

pub(crate) fn format_version_lines(report: &VersionCheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.legacy_project {
        lines.push("no installed versions recorded for this project".to_string());
    }
    for info in &report.commandsets {
        let installed = info.installed_version.as_deref().unwrap_or("-");
        let marker = if info.update_required {
            " (update available)"
        } else {
            ""
        };
        lines.push(format!(
            "{}: installed {installed}, bundled {}{marker}",
            info.name, info.bundle_version
        ));
    }
    lines
}

pub(crate) fn format_history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["no backups recorded".to_string()];
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{} {} [{}] {} file(s)",
                entry.id,
                entry.timestamp,
                entry.commandsets.join(", "),
                entry.files.len()
            )
        })
        .collect()
}

pub(crate) fn format_rollback_lines(outcome: &RollbackOutcome, style: OutputStyle) -> Vec<String> {
    let status = if outcome.failed_files.is_empty() {
        "ok"
    } else {
        "warn"
    };
    let mut lines = vec![render_status_line(
        style,
        status,
        &format!(
            "rolled back {}: {} restored, {} failed",
            outcome.backup_id,
            outcome.restored_files.len(),
            outcome.failed_files.len()
        ),
    )];
    for failure in &outcome.failed_files {
        lines.push(format!("  {}: {}", failure.path, failure.kind));
    }
    lines
}

pub(crate) fn format_settings_validation_lines(
    validation: &SettingsValidation,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = Vec::new();
    if validation.valid {
        lines.push(render_status_line(
            style,
            "ok",
            &format!("{} required settings files present", validation.existing.len()),
        ));
    } else {
        lines.push(render_status_line(
            style,
            "warn",
            &format!("{} required settings file(s) missing", validation.missing.len()),
        ));
        lines.extend(validation.missing.iter().map(|path| format!("  {path}")));
    }
    lines
}
