//! Symlink action for dotfiles.

use std::path::{Path, PathBuf};

use crate::error::ActionError;

use super::step::{Action, SatisfactionState};

/// Keeps `target` a symlink pointing at `source`.
///
/// Never removes real files or directories: anything other than a symlink
/// sitting at `target` must be moved aside (by a backup) before `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAction {
    source: PathBuf,
    target: PathBuf,
}

impl LinkAction {
    /// Create a link action.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// What the link points to.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where the link lives.
    pub fn target(&self) -> &Path {
        &self.target
    }

    fn points_at_source(&self) -> bool {
        std::fs::read_link(&self.target)
            .map(|existing| existing == self.source)
            .unwrap_or(false)
    }
}

impl Action for LinkAction {
    fn describe(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn check(&self) -> Result<SatisfactionState, ActionError> {
        if self.points_at_source() {
            Ok(SatisfactionState::AlreadySatisfied)
        } else {
            Ok(SatisfactionState::NotSatisfied)
        }
    }

    fn apply(&self) -> Result<(), ActionError> {
        if self.points_at_source() {
            return Ok(());
        }

        if let Some(parent) = self.target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ActionError::new(format!("create {}: {}", parent.display(), e))
            })?;
        }

        match std::fs::symlink_metadata(&self.target) {
            Ok(meta) if meta.file_type().is_symlink() => {
                std::fs::remove_file(&self.target).map_err(|e| {
                    ActionError::new(format!("remove stale link {}: {}", self.target.display(), e))
                })?;
            }
            Ok(_) => {
                return Err(ActionError::new(format!(
                    "{} already exists and is not a symlink",
                    self.target.display()
                )));
            }
            Err(_) => {}
        }

        create_symlink(&self.source, &self.target)
            .map_err(|e| ActionError::new(format!("link {}: {}", self.target.display(), e)))
    }

    fn revert(&self) -> Result<(), ActionError> {
        if self.points_at_source() {
            std::fs::remove_file(&self.target).map_err(|e| {
                ActionError::new(format!("remove link {}: {}", self.target.display(), e))
            })?;
        }
        Ok(())
    }

    fn is_reversible(&self) -> bool {
        true
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn create_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, link)
    } else {
        std::os::windows::fs::symlink_file(source, link)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LinkAction) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("dotfiles/zshrc");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "export EDITOR=vim\n").unwrap();
        let action = LinkAction::new(source, temp.path().join("home/.zshrc"));
        (temp, action)
    }

    #[test]
    fn apply_creates_link_and_parent() {
        let (_temp, action) = setup();

        assert_eq!(action.check().unwrap(), SatisfactionState::NotSatisfied);
        action.apply().unwrap();

        assert_eq!(action.check().unwrap(), SatisfactionState::AlreadySatisfied);
        assert_eq!(fs::read_link(action.target()).unwrap(), action.source());
    }

    #[test]
    fn apply_is_idempotent() {
        let (_temp, action) = setup();

        action.apply().unwrap();
        action.apply().unwrap();

        assert!(action.points_at_source());
    }

    #[test]
    fn apply_replaces_stale_link() {
        let (temp, action) = setup();
        fs::create_dir_all(action.target().parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(temp.path().join("elsewhere"), action.target()).unwrap();

        action.apply().unwrap();

        assert!(action.points_at_source());
    }

    #[test]
    fn apply_refuses_to_clobber_real_file() {
        let (_temp, action) = setup();
        fs::create_dir_all(action.target().parent().unwrap()).unwrap();
        fs::write(action.target(), "precious").unwrap();

        let err = action.apply().unwrap_err();

        assert!(err.message().contains("not a symlink"));
        assert_eq!(fs::read_to_string(action.target()).unwrap(), "precious");
    }

    #[test]
    fn revert_removes_only_own_link() {
        let (_temp, action) = setup();
        action.apply().unwrap();

        action.revert().unwrap();

        assert!(fs::symlink_metadata(action.target()).is_err());
        assert!(action.source().exists());
    }
}
