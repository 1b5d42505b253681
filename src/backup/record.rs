//! Backup records and on-disk naming.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timestamp layout used in backup file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const PARSE_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";
const SUFFIX: &str = ".bak";

/// One backup of one path.
///
/// Created right before a destructive step mutates `original`; never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Where the content used to live.
    pub original: PathBuf,
    /// Where the content lives now.
    pub backup: PathBuf,
    /// When the content was moved aside.
    pub timestamp: DateTime<Utc>,
}

impl BackupRecord {
    /// Rebuild a record from a backup entry found on disk.
    ///
    /// Returns `None` if the file name is not a backup name.
    pub fn from_backup_path(original: &Path, backup: &Path) -> Option<Self> {
        let name = backup.file_name()?.to_str()?;
        let timestamp = parse_backup_name(name)?;
        Some(Self {
            original: original.to_path_buf(),
            backup: backup.to_path_buf(),
            timestamp,
        })
    }
}

/// File name for a backup taken at `timestamp`.
pub fn backup_name(timestamp: DateTime<Utc>) -> String {
    format!("{}{}", timestamp.format(TIMESTAMP_FORMAT), SUFFIX)
}

/// Parse the timestamp out of a backup file name.
pub fn parse_backup_name(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_suffix(SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Pick a backup path in `dir` that does not exist yet.
///
/// Starts at `now` and bumps by one microsecond on collision.
pub fn unique_backup_path(dir: &Path, now: DateTime<Utc>) -> (PathBuf, DateTime<Utc>) {
    let mut timestamp = now.trunc_subsecs(6);
    loop {
        let candidate = dir.join(backup_name(timestamp));
        if candidate.symlink_metadata().is_err() {
            return (candidate, timestamp);
        }
        timestamp += Duration::microseconds(1);
    }
}
