//! Dependency-ordered step execution.
//!
//! The [`Executor`] walks a resolved order one step at a time. For each step
//! it decides, from what has already happened in this run, whether the step
//! may run at all; then it checks, confirms, backs up, and applies (or, in
//! reverse, reverts and restores). Every step ends up with exactly one
//! [`ReportEntry`](super::report::ReportEntry) in the returned [`RunReport`].
//!
//! Per-step failures never abort the walk by themselves: they are recorded
//! and only the failed step's dependents (or, in reverse, dependencies) are
//! blocked. Only a registry problem or a cancelled confirmation stops a run.

use std::fmt;

use tracing::{debug, info, warn};

use crate::backup::{BackupManager, RestorePolicy};
use crate::error::{ProvisionError, Result};
use crate::steps::{Direction, SatisfactionState, Step, StepRegistry};
use crate::ui::UserInterface;

use super::dependency::DependencyGraph;
use super::gate::{ConfirmationGate, ConfirmationRequest, Decision};
use super::report::{FailureReason, Outcome, RunReport, SkipReason};

/// Options for one executor invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Check steps and report what would happen without changing anything.
    pub dry_run: bool,
    /// After the first failure, skip everything that has not run yet.
    pub stop_on_failure: bool,
    /// Answer every confirmation gate with Proceed.
    pub confirm_all: bool,
    /// What to do when a restore target is occupied.
    pub restore_policy: RestorePolicy,
}

/// Where a step is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Checking,
    AwaitingConfirmation,
    Applying,
    Reverting,
    Applied,
    Skipped,
    Failed,
}

impl From<&Outcome> for StepState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Applied | Outcome::DryRun { .. } => Self::Applied,
            Outcome::Skipped(_) => Self::Skipped,
            Outcome::Failed(_) => Self::Failed,
            Outcome::AwaitingConfirmation => Self::AwaitingConfirmation,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Checking => "checking",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Applying => "applying",
            Self::Reverting => "reverting",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of handling one step.
enum StepRun {
    Done(Outcome),
    /// The gate said no; the run stops here.
    Cancelled(String),
}

/// Runs steps from a registry in dependency order.
pub struct Executor<'a> {
    registry: &'a StepRegistry,
    backups: &'a mut BackupManager,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a StepRegistry, backups: &'a mut BackupManager) -> Self {
        Self { registry, backups }
    }

    /// Bring every step in `order` into place.
    ///
    /// `order` should come from
    /// [`StepRegistry::resolve_order`] with [`Direction::Forward`].
    pub fn run(
        &mut self,
        order: &[String],
        options: &RunOptions,
        gate: &mut dyn ConfirmationGate,
        ui: &mut dyn UserInterface,
    ) -> Result<RunReport> {
        self.walk(Direction::Forward, order, options, gate, ui)
    }

    /// Undo every step in `order`.
    ///
    /// `order` should come from
    /// [`StepRegistry::resolve_order`] with [`Direction::Reverse`].
    pub fn revert(
        &mut self,
        order: &[String],
        options: &RunOptions,
        gate: &mut dyn ConfirmationGate,
        ui: &mut dyn UserInterface,
    ) -> Result<RunReport> {
        self.walk(Direction::Reverse, order, options, gate, ui)
    }

    fn walk(
        &mut self,
        direction: Direction,
        order: &[String],
        options: &RunOptions,
        gate: &mut dyn ConfirmationGate,
        ui: &mut dyn UserInterface,
    ) -> Result<RunReport> {
        let registry = self.registry;
        let mut steps = Vec::with_capacity(order.len());
        for id in order {
            let step = registry
                .get(id)
                .ok_or_else(|| ProvisionError::UnknownStep { id: id.clone() })?;
            steps.push(step);
        }
        let graph = registry.graph()?;

        let mut report = RunReport::new(direction, options.dry_run);
        let mut halted = false;
        let total = steps.len();

        info!(%direction, steps = total, dry_run = options.dry_run, "starting run");

        for (index, step) in steps.into_iter().enumerate() {
            let id = step.id();
            if report.entry(id).is_some() {
                debug!(step = id, "already handled in this run");
                continue;
            }
            debug!(step = id, state = %StepState::Pending);
            ui.show_progress(index + 1, total);

            if let Some(by) = blocker(&graph, direction, id, &report) {
                let outcome = Outcome::Skipped(SkipReason::Blocked { by });
                finish_step(&mut report, ui, step, outcome);
                continue;
            }

            if halted {
                finish_step(&mut report, ui, step, Outcome::Skipped(SkipReason::Halted));
                continue;
            }

            let run = match direction {
                Direction::Forward => self.apply_step(step, options, gate, ui),
                Direction::Reverse => self.revert_step(step, options, gate, ui),
            };

            match run {
                StepRun::Done(outcome) => {
                    let failed = outcome.is_failure();
                    finish_step(&mut report, ui, step, outcome);
                    if failed && options.stop_on_failure {
                        warn!(step = id, "stopping after failure");
                        report.aborted = Some(format!("step '{}' failed", id));
                        halted = true;
                    }
                }
                StepRun::Cancelled(reason) => {
                    finish_step(&mut report, ui, step, Outcome::AwaitingConfirmation);
                    report.aborted = Some(reason);
                    break;
                }
            }
        }

        report.finish();
        info!(
            %direction,
            failed = report.has_failures(),
            aborted = report.aborted.is_some(),
            "run finished"
        );
        Ok(report)
    }

    fn apply_step(
        &mut self,
        step: &Step,
        options: &RunOptions,
        gate: &mut dyn ConfirmationGate,
        ui: &mut dyn UserInterface,
    ) -> StepRun {
        let id = step.id();

        match check(step, ui) {
            Err(outcome) => return StepRun::Done(outcome),
            Ok(SatisfactionState::AlreadySatisfied) => {
                return StepRun::Done(Outcome::Skipped(SkipReason::AlreadySatisfied))
            }
            Ok(_) => {}
        }

        if let Some(reason) = confirm(step, Direction::Forward, options, gate, ui) {
            return StepRun::Cancelled(reason);
        }

        if options.dry_run {
            return StepRun::Done(Outcome::DryRun {
                action: dry_run_description(step),
            });
        }

        let mut spinner = ui.start_spinner(&format!("Applying {}", step.title()));

        if step.is_destructive() {
            for target in step.targets() {
                if let Err(e) = self.backups.backup_if_exists(target) {
                    spinner.finish_error(&format!("{}: backup failed", id));
                    return StepRun::Done(Outcome::Failed(FailureReason::Action(e.to_string())));
                }
            }
        }

        debug!(step = id, state = %StepState::Applying);
        match step.action().apply() {
            Ok(()) => {
                spinner.finish_success(id);
                StepRun::Done(Outcome::Applied)
            }
            Err(e) => {
                spinner.finish_error(id);
                StepRun::Done(Outcome::Failed(FailureReason::Action(
                    e.message().to_string(),
                )))
            }
        }
    }

    fn revert_step(
        &mut self,
        step: &Step,
        options: &RunOptions,
        gate: &mut dyn ConfirmationGate,
        ui: &mut dyn UserInterface,
    ) -> StepRun {
        let id = step.id();
        let reversible = step.action().is_reversible();

        if !reversible && !self.has_backup(step) {
            return StepRun::Done(Outcome::Failed(FailureReason::NotReversible));
        }

        // A failed apply can leave targets empty with the originals still
        // in the backup store; those are restored even though the step
        // itself never took effect.
        let stranded = match check(step, ui) {
            Err(outcome) => return StepRun::Done(outcome),
            Ok(SatisfactionState::NotSatisfied) => {
                let stranded = self.stranded_targets(step);
                if stranded.is_empty() {
                    return StepRun::Done(Outcome::Skipped(SkipReason::NothingToRevert));
                }
                Some(stranded)
            }
            Ok(_) => None,
        };

        if let Some(reason) = confirm(step, Direction::Reverse, options, gate, ui) {
            return StepRun::Cancelled(reason);
        }

        if options.dry_run {
            let action = match &stranded {
                Some(targets) => format!("restore backups of {}", display_paths(targets)),
                None => format!("revert {}", step.title()),
            };
            return StepRun::Done(Outcome::DryRun { action });
        }

        let mut spinner = ui.start_spinner(&format!("Reverting {}", step.title()));
        debug!(step = id, state = %StepState::Reverting);

        if let Some(targets) = stranded {
            for target in &targets {
                if let Err(e) = self.restore_latest(target, RestorePolicy::Refuse) {
                    spinner.finish_error(id);
                    return StepRun::Done(Outcome::Failed(FailureReason::RestoreConflict(
                        e.to_string(),
                    )));
                }
            }
            spinner.finish_success(id);
            return StepRun::Done(Outcome::Applied);
        }

        if reversible {
            if let Err(e) = step.action().revert() {
                spinner.finish_error(id);
                return StepRun::Done(Outcome::Failed(FailureReason::Action(
                    e.message().to_string(),
                )));
            }
        }

        // Without a revert action the target still holds the step's own
        // output, which is set aside rather than refused.
        let policy = if reversible {
            options.restore_policy
        } else {
            RestorePolicy::SetAside
        };

        if step.is_destructive() {
            for target in step.targets() {
                if let Err(e) = self.restore_latest(target, policy) {
                    spinner.finish_error(id);
                    return StepRun::Done(Outcome::Failed(FailureReason::RestoreConflict(
                        e.to_string(),
                    )));
                }
            }
        }

        spinner.finish_success(id);
        StepRun::Done(Outcome::Applied)
    }

    fn has_backup(&self, step: &Step) -> bool {
        step.is_destructive()
            && step
                .targets()
                .iter()
                .any(|t| matches!(self.backups.latest_for(t), Ok(Some(_))))
    }

    /// Targets that are missing on disk but have a backup waiting.
    fn stranded_targets(&self, step: &Step) -> Vec<std::path::PathBuf> {
        if !step.is_destructive() {
            return Vec::new();
        }
        step.targets()
            .iter()
            .filter(|t| std::fs::symlink_metadata(t).is_err())
            .filter(|t| matches!(self.backups.latest_for(t), Ok(Some(_))))
            .cloned()
            .collect()
    }

    fn restore_latest(&mut self, target: &std::path::Path, policy: RestorePolicy) -> Result<()> {
        match self.backups.latest_for(target)? {
            Some(record) => {
                self.backups.restore(&record, policy)?;
                Ok(())
            }
            None => {
                debug!(source = %target.display(), "no backup to restore");
                Ok(())
            }
        }
    }
}

/// First step whose outcome prevents `id` from running.
///
/// Forward runs look at dependencies, reverse runs at dependents.
fn blocker(
    graph: &DependencyGraph,
    direction: Direction,
    id: &str,
    report: &RunReport,
) -> Option<String> {
    let related = match direction {
        Direction::Forward => graph.dependencies_of(id),
        Direction::Reverse => graph.dependents_of(id),
    }?;

    related
        .iter()
        .find(|other| {
            report
                .outcome(other)
                .is_some_and(|outcome| outcome.blocks_others())
        })
        .cloned()
}

/// Run the step's check. An error becomes the step's final outcome.
fn check(
    step: &Step,
    ui: &mut dyn UserInterface,
) -> std::result::Result<SatisfactionState, Outcome> {
    debug!(step = step.id(), state = %StepState::Checking);
    match step.action().check() {
        Ok(SatisfactionState::Unknown) => {
            warn!(step = step.id(), "check inconclusive, proceeding");
            if ui.output_mode().shows_detail() {
                ui.warning(&format!("{}: check inconclusive, proceeding", step.id()));
            }
            Ok(SatisfactionState::Unknown)
        }
        Ok(state) => Ok(state),
        Err(e) => Err(Outcome::Failed(FailureReason::Action(
            e.message().to_string(),
        ))),
    }
}

/// Ask the gate about an interactive step. Returns the abort reason on Cancel.
fn confirm(
    step: &Step,
    direction: Direction,
    options: &RunOptions,
    gate: &mut dyn ConfirmationGate,
    ui: &mut dyn UserInterface,
) -> Option<String> {
    if !step.is_interactive() || options.confirm_all || options.dry_run {
        return None;
    }

    let prompt = match direction {
        Direction::Forward => step.prompt(),
        Direction::Reverse => format!("Revert '{}'?", step.title()),
    };
    let request = ConfirmationRequest {
        step_id: step.id().to_string(),
        title: step.title(),
        prompt,
        direction,
    };

    debug!(step = step.id(), state = %StepState::AwaitingConfirmation);
    match gate.confirm(&request) {
        Ok(Decision::Proceed) => None,
        Ok(Decision::Cancel) => Some(format!("confirmation cancelled at step '{}'", step.id())),
        Err(e) => {
            ui.error(&format!("{}: {}", step.id(), e));
            Some(format!("confirmation failed at step '{}': {}", step.id(), e))
        }
    }
}

fn dry_run_description(step: &Step) -> String {
    let mut action = step.action().describe();
    if step.is_destructive() && !step.targets().is_empty() {
        action.push_str(&format!(" (backs up {})", display_paths(step.targets())));
    }
    action
}

fn display_paths(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Record the outcome and tell the user about it.
fn finish_step(report: &mut RunReport, ui: &mut dyn UserInterface, step: &Step, outcome: Outcome) {
    let id = step.id();
    info!(step = id, state = %StepState::from(&outcome), outcome = %outcome);

    match &outcome {
        Outcome::Applied => {}
        Outcome::DryRun { action } => ui.message(&format!("  ~ {}: would {}", id, action)),
        Outcome::Skipped(SkipReason::Blocked { by }) => {
            ui.warning(&format!("{}: blocked by '{}'", id, by))
        }
        Outcome::Skipped(reason) => ui.message(&format!("  ○ {}: {}", id, reason)),
        Outcome::Failed(reason) => ui.error(&format!("{}: {}", id, reason)),
        Outcome::AwaitingConfirmation => ui.warning(&format!("{}: awaiting confirmation", id)),
    }

    report.record(id, outcome);
}
