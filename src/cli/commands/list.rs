//! List command implementation.
//!
//! The `provision list` command shows steps in install order.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::steps::{Direction, Step};
use crate::ui::theme::ProvisionTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::project::{open_project, CONFIG_ERROR_EXIT};

/// The list command implementation.
pub struct ListCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(project_root: &Path, config_override: Option<&Path>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
        }
    }
}

fn flags(step: &Step) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if step.is_destructive() {
        flags.push("destructive");
    }
    if step.is_interactive() {
        flags.push("interactive");
    }
    if !step.action().is_reversible() {
        flags.push("no revert");
    }
    flags
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(project) = open_project(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        let registry = project.registry();
        let order = registry.resolve_order(&[], Direction::Forward)?;
        let theme = ProvisionTheme::new();

        ui.message(&format!("  {}", theme.highlight.apply_to("Steps:")));
        for (index, id) in order.iter().enumerate() {
            let Some(step) = registry.get(id) else {
                continue;
            };

            let flags = flags(step);
            let detail = if flags.is_empty() {
                String::new()
            } else {
                format!(" {}", theme.dim.apply_to(format!("[{}]", flags.join(", "))))
            };
            ui.message(&format!(
                "    {} {}{}",
                theme.step_number.apply_to(format!("{}.", index + 1)),
                theme.step_title.apply_to(id),
                detail
            ));

            if step.title() != step.id() {
                ui.message(&format!("       {}", theme.dim.apply_to(step.title())));
            }
            if !step.dependencies().is_empty() {
                ui.message(&format!(
                    "       {} {}",
                    theme.dim.apply_to("└── depends on:"),
                    theme.dim.apply_to(step.dependencies().join(", "))
                ));
            }
            if ui.output_mode().shows_detail() {
                ui.message(&format!(
                    "       {}",
                    theme.dim.apply_to(step.action().describe())
                ));
            }
        }

        Ok(CommandResult::success())
    }
}
