//! Shell-command action.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::CheckSpec;
use crate::error::ActionError;
use crate::shell::{execute, CommandOptions};

use super::check::run_check;
use super::step::{Action, SatisfactionState};

/// An action whose apply and revert are shell commands.
#[derive(Debug, Clone)]
pub struct CommandAction {
    apply: String,
    revert: Option<String>,
    check: Option<CheckSpec>,
    base_dir: PathBuf,
    env: HashMap<String, String>,
    timeout: Option<u64>,
}

impl CommandAction {
    /// Create an action that runs `apply` from `base_dir`.
    pub fn new(apply: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            apply: apply.into(),
            revert: None,
            check: None,
            base_dir: base_dir.into(),
            env: HashMap::new(),
            timeout: None,
        }
    }

    /// Set the command that undoes `apply`.
    pub fn with_revert(mut self, revert: Option<String>) -> Self {
        self.revert = revert;
        self
    }

    /// Set the satisfaction probe.
    pub fn with_check(mut self, check: Option<CheckSpec>) -> Self {
        self.check = check;
        self
    }

    /// Add environment variables for every command this action runs.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    /// Kill commands that run longer than `secs`.
    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout = secs;
        self
    }

    fn options(&self) -> CommandOptions {
        CommandOptions {
            cwd: Some(self.base_dir.clone()),
            env: self.env.clone(),
            timeout: self.timeout,
            ..CommandOptions::captured()
        }
    }

    fn run(&self, command: &str) -> Result<(), ActionError> {
        let result = execute(command, &self.options())?;
        if !result.stdout.is_empty() {
            tracing::debug!(command, stdout = %result.stdout.trim_end(), "command output");
        }

        if result.success {
            Ok(())
        } else {
            Err(ActionError::new(result.failure_text()))
        }
    }
}

impl Action for CommandAction {
    fn describe(&self) -> String {
        self.apply.clone()
    }

    fn check(&self) -> Result<SatisfactionState, ActionError> {
        match &self.check {
            Some(check) => {
                let result = run_check(check, &self.base_dir, &self.options());
                tracing::debug!(state = %result.state, check = %result.description, "check ran");
                Ok(result.state)
            }
            None => Ok(SatisfactionState::Unknown),
        }
    }

    fn apply(&self) -> Result<(), ActionError> {
        self.run(&self.apply)
    }

    fn revert(&self) -> Result<(), ActionError> {
        match &self.revert {
            Some(command) => self.run(command),
            None => Err(ActionError::new("no revert command configured")),
        }
    }

    fn is_reversible(&self) -> bool {
        self.revert.is_some()
    }
}
