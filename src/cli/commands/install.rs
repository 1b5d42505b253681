//! Install command implementation.
//!
//! The `provision install` command brings every step into place.

use std::path::{Path, PathBuf};

use crate::cli::args::InstallArgs;
use crate::error::{ProvisionError, Result};
use crate::runner::{Executor, RunOptions, RunReport};
use crate::steps::Direction;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::show_summary;
use super::project::{confirmation_gate, open_project, Project, CONFIG_ERROR_EXIT};

/// The install command implementation.
pub struct InstallCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: InstallArgs,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(project_root: &Path, config_override: Option<&Path>, args: InstallArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: config_override.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }

    fn build_options(&self, project: &Project) -> RunOptions {
        RunOptions {
            dry_run: self.args.dry_run,
            stop_on_failure: self.args.stop_on_failure
                || project.config().settings.stop_on_failure,
            confirm_all: self.args.yes,
            ..Default::default()
        }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(project) = open_project(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
        };

        let order = match project
            .registry()
            .resolve_order(&self.args.only, Direction::Forward)
        {
            Ok(order) => order,
            Err(e @ ProvisionError::UnknownStep { .. }) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(CONFIG_ERROR_EXIT));
            }
            Err(e) => return Err(e),
        };

        ui.show_header(&format!("Installing {}", project.name()));
        if self.args.dry_run {
            ui.message("Dry run: nothing will be changed");
        }

        let options = self.build_options(&project);
        let mut backups = project.backups();
        let mut gate = confirmation_gate(ui);

        let report = Executor::new(project.registry(), &mut backups).run(
            &order,
            &options,
            gate.as_mut(),
            ui,
        )?;

        show_summary(ui, &report);
        if !report.dry_run {
            save_report(ui, &report, &project.report_dir());
        }

        Ok(finish(&report))
    }
}

/// Write the JSON-lines report; a failure here does not change the exit code.
pub(crate) fn save_report(ui: &mut dyn UserInterface, report: &RunReport, dir: &Path) {
    match report.write_jsonl(dir) {
        Ok(path) => {
            if ui.output_mode().shows_detail() {
                ui.message(&format!("Report: {}", path.display()));
            }
        }
        Err(e) => {
            tracing::warn!(destination = %dir.display(), error = %e, "could not write run report");
            ui.warning(&format!("Could not write run report: {}", e));
        }
    }
}

pub(crate) fn finish(report: &RunReport) -> CommandResult {
    match report.exit_code() {
        0 => CommandResult::success(),
        code => CommandResult::failure(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        project: TempDir,
        state: TempDir,
    }

    impl Fixture {
        fn new(steps: &str) -> Self {
            let project = TempDir::new().unwrap();
            let state = TempDir::new().unwrap();
            let dir = project.path().join(".provision");
            fs::create_dir_all(&dir).unwrap();
            let config = format!(
                "settings:\n  backup_dir: {}\n  report_dir: {}\n{}",
                state.path().join("backups").display(),
                state.path().join("reports").display(),
                steps
            );
            fs::write(dir.join("config.yml"), config).unwrap();
            Self { project, state }
        }

        fn run(&self, args: InstallArgs, ui: &mut MockUI) -> CommandResult {
            InstallCommand::new(self.project.path(), None, args)
                .execute(ui)
                .unwrap()
        }

        fn reports(&self) -> usize {
            fs::read_dir(self.state.path().join("reports"))
                .map(|d| d.count())
                .unwrap_or(0)
        }
    }

    #[test]
    fn installs_and_writes_report() {
        let fx = Fixture::new(
            "steps:\n  marker:\n    apply: touch installed.txt\n    check:\n      type: file_exists\n      path: installed.txt\n",
        );
        let mut ui = MockUI::new();

        let result = fx.run(InstallArgs::default(), &mut ui);

        assert!(result.success);
        assert!(fx.project.path().join("installed.txt").exists());
        assert_eq!(fx.reports(), 1);
        assert!(ui.has_success("1 applied"));
    }

    #[test]
    fn second_install_applies_nothing() {
        let fx = Fixture::new(
            "steps:\n  marker:\n    apply: touch installed.txt\n    check:\n      type: file_exists\n      path: installed.txt\n",
        );
        fx.run(InstallArgs::default(), &mut MockUI::new());
        let mut ui = MockUI::new();

        fx.run(InstallArgs::default(), &mut ui);

        assert!(ui.has_success("0 applied, 1 skipped"));
    }

    #[test]
    fn dry_run_changes_nothing() {
        let fx = Fixture::new("steps:\n  marker:\n    apply: touch installed.txt\n");
        let mut ui = MockUI::new();

        let result = fx.run(
            InstallArgs {
                dry_run: true,
                ..Default::default()
            },
            &mut ui,
        );

        assert!(result.success);
        assert!(!fx.project.path().join("installed.txt").exists());
        assert_eq!(fx.reports(), 0);
    }

    #[test]
    fn failing_step_exits_one() {
        let fx = Fixture::new("steps:\n  broken:\n    apply: exit 3\n");
        let mut ui = MockUI::new();

        let result = fx.run(InstallArgs::default(), &mut ui);

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Failed at: broken"));
    }

    #[test]
    fn unknown_only_step_exits_two() {
        let fx = Fixture::new("steps:\n  a:\n    apply: 'true'\n");
        let mut ui = MockUI::new();

        let result = fx.run(
            InstallArgs {
                only: vec!["ghost".into()],
                ..Default::default()
            },
            &mut ui,
        );

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("ghost"));
    }

    #[test]
    fn missing_config_exits_two() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = InstallCommand::new(temp.path(), None, InstallArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn yes_confirms_interactive_steps() {
        let fx = Fixture::new(
            "steps:\n  asked:\n    apply: touch asked.txt\n    interactive: true\n",
        );
        let mut ui = MockUI::new();
        ui.set_interactive(false);

        let result = fx.run(
            InstallArgs {
                yes: true,
                ..Default::default()
            },
            &mut ui,
        );

        assert!(result.success);
        assert!(fx.project.path().join("asked.txt").exists());
    }
}
