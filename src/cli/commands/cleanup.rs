//! Cleanup command implementation.
//!
//! The `provision cleanup` command reverts steps in reverse dependency
//! order and restores what destructive steps replaced.

use std::path::{Path, PathBuf};

use crate::backup::RestorePolicy;
use crate::cli::args::CleanupArgs;
use crate::error::{ProvisionError, Result};
use crate::runner::{Executor, RunOptions};
use crate::steps::Direction;
use crate::ui::{Prompt, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::show_summary;
use super::install::{finish, save_report};
use super::project::{confirmation_gate, open_project, CONFIG_ERROR_EXIT};

/// The cleanup command implementation.
pub struct CleanupCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: CleanupArgs,
}

impl CleanupCommand {
    /// Create a new cleanup command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: CleanupArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
            args,
        }
    }

    fn build_options(&self) -> RunOptions {
        RunOptions {
            confirm_all: self.args.yes,
            restore_policy: if self.args.force {
                RestorePolicy::SetAside
            } else {
                RestorePolicy::Refuse
            },
            ..Default::default()
        }
    }
}

impl Command for CleanupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(project) = open_project(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        let order = match project
            .registry()
            .resolve_order(&self.args.only, Direction::Reverse)
        {
            Ok(order) => order,
            Err(e @ ProvisionError::UnknownStep { .. }) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
            }
            Err(e) => return Err(e),
        };

        if !self.args.yes {
            let noun = if order.len() == 1 { "step" } else { "steps" };
            let prompt = Prompt::new("cleanup", format!("Revert {} {}?", order.len(), noun));
            if !ui.confirm(&prompt)? {
                ui.warning("Cleanup cancelled; nothing was changed");
                return Ok(CommandResult::failure(1));
            }
        }

        ui.show_header(&format!("Cleaning up {}", project.name()));

        let options = self.build_options();
        let mut backups = project.backups();
        let mut gate = confirmation_gate(ui);

        let report = Executor::new(project.registry(), &mut backups).revert(
            &order,
            &options,
            gate.as_mut(),
            ui,
        )?;

        show_summary(ui, &report);
        save_report(ui, &report, &project.report_dir());

        Ok(finish(&report))
    }
}
