//! Move-aside-and-restore for paths touched by destructive steps.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::{ProvisionError, Result};

use super::fs::{is_occupied, move_path};
use super::record::{unique_backup_path, BackupRecord};

/// What `restore` does when the original path is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// Fail with [`ProvisionError::RestoreConflict`].
    #[default]
    Refuse,
    /// Back up the occupant first, then restore.
    SetAside,
}

/// Keeps timestamped backups under a root directory.
///
/// A path's backups live in `<root>/<path without its root>/<timestamp>.bak`,
/// so every backup ever taken of a path can be found again from the path
/// alone. Backups are never deleted by this type.
#[derive(Debug)]
pub struct BackupManager {
    root: PathBuf,
    records: Vec<BackupRecord>,
}

impl BackupManager {
    /// Create a manager that stores backups under `root`.
    ///
    /// The directory is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            records: Vec::new(),
        }
    }

    /// The backup root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backups taken by this manager, oldest first.
    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }

    /// Move `path` into a fresh backup location if anything is there.
    ///
    /// Files, directories, and symlinks (dangling ones too) are all backed
    /// up. Returns `None` if nothing existed.
    pub fn backup_if_exists(&mut self, path: &Path) -> Result<Option<BackupRecord>> {
        let original = absolute(path)?;

        if !is_occupied(&original) {
            info!(source = %original.display(), "nothing to back up");
            return Ok(None);
        }

        let dir = self.storage_dir(&original);
        std::fs::create_dir_all(&dir)?;
        let (backup, timestamp) = unique_backup_path(&dir, Utc::now());

        move_path(&original, &backup)?;
        info!(
            source = %original.display(),
            destination = %backup.display(),
            "backed up"
        );

        let record = BackupRecord {
            original,
            backup,
            timestamp,
        };
        self.records.push(record.clone());
        Ok(Some(record))
    }

    /// Move a backup back to its original path.
    ///
    /// With [`RestorePolicy::SetAside`], whatever occupies the original path
    /// is backed up first and its record is returned.
    pub fn restore(
        &mut self,
        record: &BackupRecord,
        policy: RestorePolicy,
    ) -> Result<Option<BackupRecord>> {
        if !is_occupied(&record.backup) {
            return Err(ProvisionError::BackupMissing {
                path: record.backup.clone(),
            });
        }

        let set_aside = if is_occupied(&record.original) {
            match policy {
                RestorePolicy::Refuse => {
                    info!(
                        source = %record.backup.display(),
                        destination = %record.original.display(),
                        "restore refused, destination occupied"
                    );
                    return Err(ProvisionError::RestoreConflict {
                        path: record.original.clone(),
                        backup: record.backup.clone(),
                    });
                }
                RestorePolicy::SetAside => self.backup_if_exists(&record.original)?,
            }
        } else {
            None
        };

        move_path(&record.backup, &record.original)?;
        info!(
            source = %record.backup.display(),
            destination = %record.original.display(),
            "restored"
        );

        Ok(set_aside)
    }

    /// Every backup of `path` still on disk, oldest first.
    pub fn records_for(&self, path: &Path) -> Result<Vec<BackupRecord>> {
        let original = absolute(path)?;
        let dir = self.storage_dir(&original);

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(record) = BackupRecord::from_backup_path(&original, &entry.path()) {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    /// The newest backup of `path` still on disk.
    pub fn latest_for(&self, path: &Path) -> Result<Option<BackupRecord>> {
        Ok(self.records_for(path)?.pop())
    }

    /// Every backup under the root, oldest first.
    pub fn all_records(&self) -> Result<Vec<BackupRecord>> {
        let mut records = Vec::new();
        if self.root.is_dir() {
            self.collect(&self.root, &mut records)?;
        }
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.original.cmp(&b.original))
        });
        Ok(records)
    }

    fn collect(&self, dir: &Path, out: &mut Vec<BackupRecord>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let original = self.original_for(dir);

            if let Some(record) = BackupRecord::from_backup_path(&original, &path) {
                out.push(record);
            } else if entry.file_type()?.is_dir() {
                self.collect(&path, out)?;
            }
        }
        Ok(())
    }

    /// Directory holding the backups of `original`.
    fn storage_dir(&self, original: &Path) -> PathBuf {
        let mut dir = self.root.clone();
        for component in original.components() {
            match component {
                Component::Prefix(prefix) => {
                    let drive: String = prefix
                        .as_os_str()
                        .to_string_lossy()
                        .chars()
                        .filter(|c| c.is_alphanumeric())
                        .collect();
                    dir.push(drive);
                }
                Component::Normal(part) => dir.push(part),
                Component::RootDir | Component::CurDir | Component::ParentDir => {}
            }
        }
        dir
    }

    /// Inverse of `storage_dir` for directories under the root.
    fn original_for(&self, storage_dir: &Path) -> PathBuf {
        let relative = storage_dir.strip_prefix(&self.root).unwrap_or(storage_dir);
        Path::new(std::path::MAIN_SEPARATOR_STR).join(relative)
    }
}

/// Absolute, lexically normalized form of `path`. Symlinks are not followed.
fn absolute(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
