//! Backups command implementation.
//!
//! The `provision backups` command lists backups found on disk, newest last
//! for each original path.

use std::path::{Path, PathBuf};

use crate::backup::{BackupManager, BackupRecord};
use crate::cli::args::BackupsArgs;
use crate::error::Result;
use crate::steps::expand_path;
use crate::ui::theme::ProvisionTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::project::{open_project, CONFIG_ERROR_EXIT};

/// The backups command implementation.
pub struct BackupsCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: BackupsArgs,
}

impl BackupsCommand {
    /// Create a new backups command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: BackupsArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
            args,
        }
    }

    fn records(&self, manager: &BackupManager) -> Result<Vec<BackupRecord>> {
        match &self.args.path {
            Some(path) => {
                let path = expand_path(&path.to_string_lossy(), &self.cwd());
                manager.records_for(&path)
            }
            None => manager.all_records(),
        }
    }

    fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| self.project_root.clone())
    }
}

impl Command for BackupsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(project) = open_project(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        let manager = project.backups();
        let records = self.records(&manager)?;
        let theme = ProvisionTheme::new();

        if records.is_empty() {
            ui.message(&format!("No backups in {}", manager.root().display()));
            return Ok(CommandResult::success());
        }

        let mut current: Option<&Path> = None;
        for record in &records {
            if current != Some(record.original.as_path()) {
                ui.message(&format!(
                    "  {}",
                    theme.highlight.apply_to(record.original.display())
                ));
                current = Some(record.original.as_path());
            }
            ui.message(&format!(
                "    {} {}",
                theme.step_number.apply_to(record.timestamp.format("%Y-%m-%d %H:%M:%S%.6f UTC")),
                theme.dim.apply_to(record.backup.display())
            ));
        }

        Ok(CommandResult::success())
    }
}
