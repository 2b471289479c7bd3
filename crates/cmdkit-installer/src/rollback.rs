use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use cmdkit_core::{CommandsetError, CommandsetRegistry, IoResultExt, Result, Storage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fs_utils::{relative_display, sha256_hex, write_failure_kind};
use crate::{FileFailure, FileFailureKind, ProjectLayout, MERGED_DOCUMENT};

pub const MAX_HISTORY_ENTRIES: usize = 10;

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);
const LOCK_ATTEMPTS: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub commandsets: Vec<String>,
    pub files: Vec<String>,
    /// sha256 of each captured file, keyed like `files`.
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    pub backup_id: String,
    pub restored_files: Vec<String>,
    pub failed_files: Vec<FileFailure>,
}

/// Snapshots project files before a mutating install and restores them.
///
/// The history index is rewritten while holding `.cmdkit/history.lock`, so
/// backups from separate managers or processes on one project never drop each
/// other's entries. `index_lock` keeps threads of one manager from spinning on
/// that file.
pub struct RollbackManager {
    registry: Arc<CommandsetRegistry>,
    storage: Arc<dyn Storage>,
    index_lock: Mutex<()>,
}

impl RollbackManager {
    pub fn new(registry: Arc<CommandsetRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self {
            registry,
            storage,
            index_lock: Mutex::new(()),
        }
    }

    /// Records an entry even when there is nothing to capture.
    pub fn create_backup<S: AsRef<str>>(
        &self,
        layout: &ProjectLayout,
        commandsets: &[S],
    ) -> Result<HistoryEntry> {
        let now = Utc::now();
        let simple = Uuid::new_v4().simple().to_string();
        let backup_id = format!(
            "backup-{}-{}",
            now.format("%Y%m%dT%H%M%S%3fZ"),
            &simple[..8]
        );
        let commandsets = commandsets
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect::<Vec<_>>();

        let entry = match self.capture(layout, &backup_id, &commandsets) {
            Ok((files, checksums)) => HistoryEntry {
                id: backup_id.clone(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
                commandsets,
                files,
                checksums,
            },
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&layout.backup_dir(&backup_id)) {
                    tracing::warn!(backup = %backup_id, error = %cleanup, "failed to remove partial backup");
                }
                return Err(backup_failed(&backup_id, err));
            }
        };

        if let Err(err) = self.append_entry(layout, entry.clone()) {
            if let Err(cleanup) = self.storage.remove(&layout.backup_dir(&backup_id)) {
                tracing::warn!(backup = %backup_id, error = %cleanup, "failed to remove unindexed backup");
            }
            return Err(backup_failed(&backup_id, err));
        }

        tracing::info!(
            backup = %entry.id,
            files = entry.files.len(),
            "created backup"
        );
        Ok(entry)
    }

    /// Copies every file of a backup back into the project. The backup stays
    /// in place, so a rollback can be repeated.
    pub fn rollback(&self, layout: &ProjectLayout, backup_id: &str) -> Result<RollbackOutcome> {
        if !is_backup_id(backup_id) {
            return Err(CommandsetError::BackupNotFound {
                backup_id: backup_id.to_string(),
            });
        }
        let backup_dir = layout.backup_dir(backup_id);
        if !self.storage.is_dir(&backup_dir) {
            return Err(CommandsetError::BackupNotFound {
                backup_id: backup_id.to_string(),
            });
        }

        let checksums = match self.get_backup(layout, backup_id) {
            Ok(entry) => entry.map(|entry| entry.checksums).unwrap_or_default(),
            Err(err) => {
                tracing::warn!(backup = backup_id, error = %err, "restoring without checksums");
                BTreeMap::new()
            }
        };
        let files = self
            .storage
            .list(&backup_dir)
            .with_path("failed to list backup", &backup_dir)?;

        let mut outcome = RollbackOutcome {
            backup_id: backup_id.to_string(),
            restored_files: Vec::new(),
            failed_files: Vec::new(),
        };
        for relative in files {
            let path = relative_display(&relative);
            match self.restore_file(layout, &backup_dir, &relative, checksums.get(&path)) {
                Ok(()) => outcome.restored_files.push(path),
                Err(kind) => {
                    tracing::warn!(backup = backup_id, file = %path, reason = %kind, "failed to restore file");
                    outcome.failed_files.push(FileFailure { path, kind });
                }
            }
        }

        if outcome.restored_files.is_empty() && !outcome.failed_files.is_empty() {
            return Err(CommandsetError::RollbackFailed {
                backup_id: backup_id.to_string(),
                failed: outcome
                    .failed_files
                    .into_iter()
                    .map(|failure| failure.path)
                    .collect(),
            });
        }

        tracing::info!(
            backup = backup_id,
            restored = outcome.restored_files.len(),
            failed = outcome.failed_files.len(),
            "rolled back"
        );
        Ok(outcome)
    }

    /// Most recent first.
    pub fn get_history(&self, layout: &ProjectLayout) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.read_index(layout)?;
        sort_oldest_first(&mut entries);
        entries.reverse();
        Ok(entries)
    }

    pub fn get_backup(&self, layout: &ProjectLayout, backup_id: &str) -> Result<Option<HistoryEntry>> {
        Ok(self
            .read_index(layout)?
            .into_iter()
            .find(|entry| entry.id == backup_id))
    }

    fn capture(
        &self,
        layout: &ProjectLayout,
        backup_id: &str,
        commandsets: &[String],
    ) -> Result<(Vec<String>, BTreeMap<String, String>)> {
        let mut files = BTreeSet::new();
        for name in commandsets {
            let Some(definition) = self.registry.definition(name) else {
                tracing::warn!(commandset = %name, "backup skips unknown commandset");
                continue;
            };
            for root in definition.owned_roots() {
                let root_path = layout.resolve(&root);
                let listed = self
                    .storage
                    .list(&root_path)
                    .with_path("failed to enumerate backup root", &root_path)?;
                for relative in listed {
                    files.insert(relative_display(&Path::new(&root).join(relative)));
                }
            }
        }
        if self.storage.exists(&layout.merged_document_path()) {
            files.insert(MERGED_DOCUMENT.to_string());
        }

        let backup_dir = layout.backup_dir(backup_id);
        self.storage
            .create_dir_all(&backup_dir)
            .with_path("failed to create backup folder", &backup_dir)?;

        let mut checksums = BTreeMap::new();
        for file in &files {
            let source = layout.resolve(file);
            let bytes = self
                .storage
                .read(&source)
                .with_path("failed to read file for backup", &source)?;
            let destination = backup_dir.join(file);
            self.storage
                .write(&destination, &bytes)
                .with_path("failed to write backup copy", &destination)?;
            checksums.insert(file.clone(), sha256_hex(&bytes));
        }

        Ok((files.into_iter().collect(), checksums))
    }

    fn restore_file(
        &self,
        layout: &ProjectLayout,
        backup_dir: &Path,
        relative: &Path,
        expected_checksum: Option<&String>,
    ) -> std::result::Result<(), FileFailureKind> {
        let bytes = self
            .storage
            .read(&backup_dir.join(relative))
            .map_err(|err| FileFailureKind::ReadFailed(err.to_string()))?;
        if let Some(expected) = expected_checksum {
            if sha256_hex(&bytes) != *expected {
                return Err(FileFailureKind::ChecksumMismatch);
            }
        }
        self.storage
            .write(&layout.resolve(relative), &bytes)
            .map_err(|err| write_failure_kind(&err))
    }

    fn append_entry(&self, layout: &ProjectLayout, entry: HistoryEntry) -> Result<()> {
        let _guard = self.index_lock.lock();
        let _lock = self.lock_index(layout)?;
        let mut entries = match self.read_index(layout) {
            Ok(entries) => entries,
            Err(err @ CommandsetError::Serialization { .. }) => {
                tracing::warn!(error = %err, "backup history is corrupt, starting a new one");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        entries.push(entry);
        sort_oldest_first(&mut entries);

        // Only the oldest overflow is evicted; a failed removal is retried on
        // the next append.
        let excess = entries.len().saturating_sub(MAX_HISTORY_ENTRIES);
        let mut kept = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if index >= excess {
                kept.push(entry);
                continue;
            }
            match self.storage.remove(&layout.backup_dir(&entry.id)) {
                Ok(()) => tracing::debug!(backup = %entry.id, "evicted backup"),
                Err(err) => {
                    tracing::warn!(backup = %entry.id, error = %err, "failed to evict backup, keeping its entry");
                    kept.push(entry);
                }
            }
        }
        if kept.len() > MAX_HISTORY_ENTRIES {
            tracing::warn!(
                overflow = kept.len() - MAX_HISTORY_ENTRIES,
                "backup history exceeds its limit until eviction succeeds"
            );
        }

        self.write_index(layout, &kept)
    }

    fn lock_index(&self, layout: &ProjectLayout) -> Result<IndexLock<'_>> {
        let path = layout.history_lock_path();
        let owner = std::process::id().to_string();
        for _ in 0..LOCK_ATTEMPTS {
            match self.storage.create_new(&path, owner.as_bytes()) {
                Ok(()) => {
                    return Ok(IndexLock {
                        storage: self.storage.as_ref(),
                        path,
                    })
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => {
                    return Err(CommandsetError::io(
                        "failed to lock backup history",
                        &path,
                        err,
                    ))
                }
            }
        }
        Err(CommandsetError::io(
            "backup history stayed locked; remove the lock file if no install is running",
            &path,
            io::Error::new(io::ErrorKind::WouldBlock, "lock held by another writer"),
        ))
    }

    fn read_index(&self, layout: &ProjectLayout) -> Result<Vec<HistoryEntry>> {
        let path = layout.history_path();
        if !self.storage.exists(&path) {
            return Ok(Vec::new());
        }
        let raw = self
            .storage
            .read(&path)
            .with_path("failed to read backup history", &path)?;
        serde_json::from_slice(&raw).map_err(|err| {
            CommandsetError::serialization(
                format!("failed to parse backup history: {}", path.display()),
                err,
            )
        })
    }

    fn write_index(&self, layout: &ProjectLayout, entries: &[HistoryEntry]) -> Result<()> {
        let path = layout.history_path();
        let payload = serde_json::to_vec_pretty(entries)
            .map_err(|err| CommandsetError::serialization("failed to encode backup history", err))?;
        self.storage
            .write(&path, &payload)
            .with_path("failed to write backup history", &path)
    }
}

/// Held while the history index is rewritten; releases the lock file on drop.
struct IndexLock<'a> {
    storage: &'a dyn Storage,
    path: PathBuf,
}

impl Drop for IndexLock<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.storage.remove(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %err, "failed to release backup history lock");
        }
    }
}

/// A single plain path segment, so the id cannot leave the backups folder.
fn is_backup_id(backup_id: &str) -> bool {
    if backup_id.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(backup_id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Stable, so entries sharing a timestamp keep their append order.
fn sort_oldest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|left, right| left.timestamp.cmp(&right.timestamp));
}

fn backup_failed(backup_id: &str, source: CommandsetError) -> CommandsetError {
    CommandsetError::BackupFailed {
        backup_id: backup_id.to_string(),
        source: Box::new(source),
    }
}
