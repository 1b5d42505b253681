//! Turning a parsed configuration into runnable steps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::schema::{ProvisionConfig, Settings, StepConfig};
use crate::error::Result;
use crate::runner::default_report_dir;
use crate::steps::{expand_path, Action, CommandAction, LinkAction, Step, StepRegistry};

/// Overrides `settings.backup_dir`.
pub const BACKUP_DIR_ENV: &str = "PROVISION_BACKUP_DIR";
/// Overrides `settings.report_dir`.
pub const REPORT_DIR_ENV: &str = "PROVISION_REPORT_DIR";

/// Build a registry holding one step per configured step, in file order.
///
/// Relative paths and commands resolve against `base_dir`, normally the
/// project root. The config should already be validated; registry errors
/// (duplicates) still surface here.
pub fn build_registry(config: &ProvisionConfig, base_dir: &Path) -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();
    for (id, step_config) in config.steps.iter() {
        registry.register(build_step(id, step_config, &config.settings, base_dir))?;
    }
    Ok(registry)
}

fn build_step(id: &str, config: &StepConfig, settings: &Settings, base_dir: &Path) -> Step {
    let (action, mut targets): (Box<dyn Action>, Vec<PathBuf>) = match &config.link {
        Some(link) => {
            let target = expand_path(&link.target, base_dir);
            let action = LinkAction::new(expand_path(&link.source, base_dir), target.clone());
            (Box::new(action), vec![target])
        }
        None => {
            let mut env: HashMap<String, String> = settings.env.clone();
            env.extend(config.env.clone());

            let action = CommandAction::new(config.apply.clone().unwrap_or_default(), base_dir)
                .with_revert(config.revert.clone())
                .with_check(config.check.clone())
                .with_env(env)
                .with_timeout(config.timeout);
            (Box::new(action), Vec::new())
        }
    };

    targets.extend(config.targets.iter().map(|t| expand_path(t, base_dir)));

    let mut step = Step::from_boxed(id, action).depends_on(config.depends_on.iter().cloned());

    if let Some(title) = &config.title {
        step = step.with_title(title.clone());
    }
    if config.destructive || config.link.is_some() {
        step = step.destructive(targets);
    }
    if config.interactive {
        step = step.interactive(config.prompt.clone());
    }

    step
}

/// Directory backups are kept in.
///
/// `PROVISION_BACKUP_DIR` wins over `settings.backup_dir`; the default is
/// `~/.provision/backups`.
pub fn backup_dir(settings: &Settings, base_dir: &Path) -> PathBuf {
    resolve_dir(
        std::env::var(BACKUP_DIR_ENV).ok(),
        settings.backup_dir.as_deref(),
        base_dir,
    )
    .unwrap_or_else(default_backup_dir)
}

/// Directory run reports are written to.
///
/// `PROVISION_REPORT_DIR` wins over `settings.report_dir`; the default is
/// `~/.provision/reports`.
pub fn report_dir(settings: &Settings, base_dir: &Path) -> PathBuf {
    resolve_dir(
        std::env::var(REPORT_DIR_ENV).ok(),
        settings.report_dir.as_deref(),
        base_dir,
    )
    .unwrap_or_else(default_report_dir)
}

/// Default directory for backups: `~/.provision/backups`.
pub fn default_backup_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".provision")
        .join("backups")
}

fn resolve_dir(env: Option<String>, setting: Option<&str>, base_dir: &Path) -> Option<PathBuf> {
    env.as_deref()
        .filter(|v| !v.is_empty())
        .or(setting)
        .map(|raw| expand_path(raw, base_dir))
}
