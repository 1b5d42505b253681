//! Backups for destructive steps.
//!
//! Before a destructive step mutates a path, the [`BackupManager`] moves
//! whatever is there into a timestamped backup location and hands back a
//! [`BackupRecord`]. Cleanup uses the record to move the content back.
//!
//! # Example
//!
//! ```
//! use provision::backup::{BackupManager, RestorePolicy};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join(".zshrc");
//! fs::write(&path, "old").unwrap();
//!
//! let mut backups = BackupManager::new(temp.path().join("backups"));
//! let record = backups.backup_if_exists(&path).unwrap().unwrap();
//! assert!(!path.exists());
//!
//! backups.restore(&record, RestorePolicy::Refuse).unwrap();
//! assert_eq!(fs::read_to_string(&path).unwrap(), "old");
//! ```

pub mod fs;
pub mod manager;
pub mod record;

pub use manager::{BackupManager, RestorePolicy};
pub use record::BackupRecord;
