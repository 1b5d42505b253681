//! Loading a project for a command.

use std::path::{Path, PathBuf};

use crate::backup::BackupManager;
use crate::config::{backup_dir, build_registry, load_config, report_dir, validate, ProvisionConfig};
use crate::error::{ProvisionError, Result};
use crate::runner::{ConfirmationGate, EnvGate, PromptGate};
use crate::steps::StepRegistry;
use crate::ui::{OutputMode, UserInterface};

/// Exit code for configuration problems.
pub const CONFIG_ERROR_EXIT: i32 = 2;

/// A loaded, validated project.
pub struct Project {
    root: PathBuf,
    config: ProvisionConfig,
    registry: StepRegistry,
}

impl Project {
    /// Load, validate, and build the registry.
    pub fn load(root: &Path, config_override: Option<&Path>) -> Result<Self> {
        let config = load_config(root, config_override)?;
        validate(&config)?;
        let registry = build_registry(&config, root)?;

        Ok(Self {
            root: root.to_path_buf(),
            config,
            registry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Display name for headers.
    pub fn name(&self) -> &str {
        self.config.app_name.as_deref().unwrap_or("project")
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(backup_dir(&self.config.settings, &self.root))
    }

    pub fn report_dir(&self) -> PathBuf {
        report_dir(&self.config.settings, &self.root)
    }

    /// Apply `settings.default_output` unless a flag already chose a mode.
    pub fn apply_default_output(&self, ui: &mut dyn UserInterface) {
        if ui.output_mode() == OutputMode::Normal {
            if let Some(mode) = self.config.settings.default_output {
                ui.set_output_mode(mode.into());
            }
        }
    }
}

/// Whether an error comes from the config file rather than from running.
pub fn is_config_error(err: &ProvisionError) -> bool {
    matches!(
        err,
        ProvisionError::ConfigNotFound { .. }
            | ProvisionError::ConfigParseError { .. }
            | ProvisionError::ConfigValidationError { .. }
            | ProvisionError::DuplicateStep { .. }
            | ProvisionError::UnknownDependency { .. }
            | ProvisionError::CycleDetected { .. }
    )
}

/// Load the project, printing config errors through the UI.
///
/// Returns `Ok(None)` when the config is missing or invalid; callers exit
/// with [`CONFIG_ERROR_EXIT`].
pub fn open_project(
    root: &Path,
    config_override: Option<&Path>,
    ui: &mut dyn UserInterface,
) -> Result<Option<Project>> {
    match Project::load(root, config_override) {
        Ok(project) => {
            project.apply_default_output(ui);
            Ok(Some(project))
        }
        Err(ProvisionError::ConfigNotFound { path }) => {
            ui.error(&format!("No configuration found at {}", path.display()));
            Ok(None)
        }
        Err(e) if is_config_error(&e) => {
            ui.error(&e.to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Gate for interactive steps: a terminal prompt when someone is there,
/// otherwise `PROVISION_CONFIRM_*` variables.
pub fn confirmation_gate(ui: &dyn UserInterface) -> Box<dyn ConfirmationGate> {
    if ui.is_interactive() {
        Box::new(PromptGate::new())
    } else {
        Box::new(EnvGate::from_env())
    }
}
