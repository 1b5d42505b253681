//! Integration tests for the backup public API.

use std::fs;

use provision::backup::{BackupManager, RestorePolicy};
use provision::ProvisionError;
use tempfile::TempDir;

#[test]
fn round_trip_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("blob.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    fs::write(&target, &content).unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));

    let record = manager.backup_if_exists(&target).unwrap().unwrap();
    assert!(!target.exists());

    manager.restore(&record, RestorePolicy::Refuse).unwrap();

    assert_eq!(fs::read(&target).unwrap(), content);
}

#[test]
fn missing_path_has_nothing_to_back_up() {
    let temp = TempDir::new().unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));

    let record = manager.backup_if_exists(&temp.path().join("absent")).unwrap();

    assert!(record.is_none());
    assert!(manager.records().is_empty());
}

#[test]
fn directories_are_backed_up_whole() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nvim");
    fs::create_dir_all(target.join("lua")).unwrap();
    fs::write(target.join("lua").join("init.lua"), "-- config").unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));

    let record = manager.backup_if_exists(&target).unwrap().unwrap();
    manager.restore(&record, RestorePolicy::Refuse).unwrap();

    assert_eq!(
        fs::read_to_string(target.join("lua").join("init.lua")).unwrap(),
        "-- config"
    );
}

#[test]
fn refuse_policy_keeps_the_occupant() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("zshrc");
    fs::write(&target, "old").unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));
    let record = manager.backup_if_exists(&target).unwrap().unwrap();
    fs::write(&target, "newer").unwrap();

    let err = manager.restore(&record, RestorePolicy::Refuse).unwrap_err();

    assert!(matches!(err, ProvisionError::RestoreConflict { .. }));
    assert_eq!(fs::read_to_string(&target).unwrap(), "newer");
    assert_eq!(fs::read_to_string(&record.backup).unwrap(), "old");
}

#[test]
fn set_aside_policy_loses_nothing() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("zshrc");
    fs::write(&target, "old").unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));
    let record = manager.backup_if_exists(&target).unwrap().unwrap();
    fs::write(&target, "newer").unwrap();

    let set_aside = manager
        .restore(&record, RestorePolicy::SetAside)
        .unwrap()
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    assert_eq!(fs::read_to_string(&set_aside.backup).unwrap(), "newer");
}

#[test]
fn backups_are_found_by_a_new_manager() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("backups");
    let target = temp.path().join("gitconfig");

    let mut first = BackupManager::new(&root);
    fs::write(&target, "one").unwrap();
    first.backup_if_exists(&target).unwrap();
    fs::write(&target, "two").unwrap();
    first.backup_if_exists(&target).unwrap();

    let second = BackupManager::new(&root);
    let records = second.records_for(&target).unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].timestamp < records[1].timestamp);
    let latest = second.latest_for(&target).unwrap().unwrap();
    assert_eq!(fs::read_to_string(latest.backup).unwrap(), "two");
    assert_eq!(second.all_records().unwrap().len(), 2);
}

#[test]
fn restoring_a_missing_backup_fails() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("gitconfig");
    fs::write(&target, "old").unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));
    let record = manager.backup_if_exists(&target).unwrap().unwrap();
    fs::remove_file(&record.backup).unwrap();

    let err = manager.restore(&record, RestorePolicy::Refuse).unwrap_err();

    assert!(matches!(err, ProvisionError::BackupMissing { .. }));
}

#[cfg(unix)]
#[test]
fn dangling_symlink_is_backed_up() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("link");
    std::os::unix::fs::symlink(temp.path().join("nowhere"), &target).unwrap();
    let mut manager = BackupManager::new(temp.path().join("backups"));

    let record = manager.backup_if_exists(&target).unwrap().unwrap();

    assert!(fs::symlink_metadata(&target).is_err());
    assert!(fs::symlink_metadata(&record.backup).unwrap().file_type().is_symlink());
}
