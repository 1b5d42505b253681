//! Check implementations for command-backed steps.
//!
//! A check is a side-effect-free probe that decides whether a step's goal
//! is already in place.

use crate::config::CheckSpec;
use crate::shell::{execute, CommandOptions};
use std::path::Path;

use super::paths::expand_path;
use super::step::SatisfactionState;

/// Result of running a check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// What the probe concluded.
    pub state: SatisfactionState,

    /// Description of what was checked.
    pub description: String,
}

impl CheckResult {
    fn new(state: SatisfactionState, description: impl Into<String>) -> Self {
        Self {
            state,
            description: description.into(),
        }
    }
}

/// Run a check, resolving relative paths against `base_dir`.
///
/// Check commands run from `base_dir` with the same environment and
/// timeout as the step's own commands.
pub fn run_check(check: &CheckSpec, base_dir: &Path, options: &CommandOptions) -> CheckResult {
    match check {
        CheckSpec::FileExists { path } => check_file_exists(path, base_dir),
        CheckSpec::CommandSucceeds { command } => {
            check_command_succeeds(command, base_dir, options)
        }
        CheckSpec::Symlink { path, points_to } => check_symlink(path, points_to, base_dir),
        CheckSpec::All { checks } => check_all(checks, base_dir, options),
        CheckSpec::Any { checks } => check_any(checks, base_dir, options),
    }
}

/// Check if a file, directory, or symlink exists.
fn check_file_exists(path: &str, base_dir: &Path) -> CheckResult {
    let full_path = expand_path(path, base_dir);

    if full_path.symlink_metadata().is_ok() {
        CheckResult::new(
            SatisfactionState::AlreadySatisfied,
            format!("File exists: {}", path),
        )
    } else {
        CheckResult::new(
            SatisfactionState::NotSatisfied,
            format!("File missing: {}", path),
        )
    }
}

/// Check if a command succeeds (exit code 0).
///
/// A command that cannot be started, or that times out, yields `Unknown`.
fn check_command_succeeds(
    command: &str,
    base_dir: &Path,
    options: &CommandOptions,
) -> CheckResult {
    let options = CommandOptions {
        cwd: Some(base_dir.to_path_buf()),
        ..options.clone()
    };

    match execute(command, &options) {
        Ok(result) if result.timed_out => {
            tracing::warn!(command, "check command timed out");
            CheckResult::new(
                SatisfactionState::Unknown,
                format!("Command timed out: {}", truncate(command, 50)),
            )
        }
        Ok(result) if result.success => CheckResult::new(
            SatisfactionState::AlreadySatisfied,
            format!("Command succeeded: {}", truncate(command, 50)),
        ),
        Ok(_) => CheckResult::new(
            SatisfactionState::NotSatisfied,
            format!("Command failed: {}", truncate(command, 50)),
        ),
        Err(e) => {
            tracing::warn!(command, error = %e, "check command could not run");
            CheckResult::new(
                SatisfactionState::Unknown,
                format!("Command could not run: {}", truncate(command, 50)),
            )
        }
    }
}

/// Check if `path` is a symlink pointing at `points_to`.
fn check_symlink(path: &str, points_to: &str, base_dir: &Path) -> CheckResult {
    let link = expand_path(path, base_dir);
    let expected = expand_path(points_to, base_dir);

    match std::fs::read_link(&link) {
        Ok(actual) if actual == expected => CheckResult::new(
            SatisfactionState::AlreadySatisfied,
            format!("Link in place: {}", path),
        ),
        Ok(actual) => CheckResult::new(
            SatisfactionState::NotSatisfied,
            format!("Link points to {}: {}", actual.display(), path),
        ),
        Err(_) => CheckResult::new(
            SatisfactionState::NotSatisfied,
            format!("Link missing: {}", path),
        ),
    }
}

/// All checks must pass.
///
/// Any `NotSatisfied` wins; otherwise any `Unknown` makes the whole check unknown.
fn check_all(checks: &[CheckSpec], base_dir: &Path, options: &CommandOptions) -> CheckResult {
    let results: Vec<_> = checks
        .iter()
        .map(|c| run_check(c, base_dir, options))
        .collect();

    let failed: Vec<_> = results
        .iter()
        .filter(|r| r.state == SatisfactionState::NotSatisfied)
        .map(|r| r.description.clone())
        .collect();

    if !failed.is_empty() {
        return CheckResult::new(
            SatisfactionState::NotSatisfied,
            format!("{}/{} checks failed: {}", failed.len(), checks.len(), failed.join("; ")),
        );
    }

    if results.iter().any(|r| r.state == SatisfactionState::Unknown) {
        return CheckResult::new(
            SatisfactionState::Unknown,
            format!("Some of {} checks were inconclusive", checks.len()),
        );
    }

    CheckResult::new(
        SatisfactionState::AlreadySatisfied,
        format!("All {} checks passed", checks.len()),
    )
}

/// Any check passing is sufficient.
fn check_any(checks: &[CheckSpec], base_dir: &Path, options: &CommandOptions) -> CheckResult {
    let results: Vec<_> = checks
        .iter()
        .map(|c| run_check(c, base_dir, options))
        .collect();

    if let Some(passed) = results.iter().find(|r| r.state.is_satisfied()) {
        return CheckResult::new(
            SatisfactionState::AlreadySatisfied,
            format!("Check passed: {}", passed.description),
        );
    }

    let state = if results.iter().any(|r| r.state == SatisfactionState::Unknown) {
        SatisfactionState::Unknown
    } else {
        SatisfactionState::NotSatisfied
    };

    CheckResult::new(
        state,
        format!(
            "None of {} checks passed: {}",
            checks.len(),
            results
                .iter()
                .map(|r| r.description.clone())
                .collect::<Vec<_>>()
                .join("; ")
        ),
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
