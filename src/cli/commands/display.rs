//! Shared display helpers for run summaries.
//!
//! Used by `install` and `cleanup` once the executor has finished.

use crate::runner::{Outcome, RunReport};
use crate::steps::Direction;
use crate::ui::UserInterface;

/// Bracketed symbol for an outcome (non-TTY output).
pub fn outcome_symbol(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "[ok]",
        Outcome::DryRun { .. } => "[plan]",
        Outcome::Skipped(_) => "[skip]",
        Outcome::Failed(_) => "[FAIL]",
        Outcome::AwaitingConfirmation => "[wait]",
    }
}

/// Print the closing summary of a run, styled by its worst outcome.
pub fn show_summary(ui: &mut dyn UserInterface, report: &RunReport) {
    let summary = report.summary();
    let verb = match report.direction {
        Direction::Forward => "applied",
        Direction::Reverse => "reverted",
    };

    let mut parts = Vec::new();
    if report.dry_run {
        parts.push(format!("{} planned", summary.dry_run));
    } else {
        parts.push(format!("{} {}", summary.applied, verb));
    }
    parts.push(format!("{} skipped", summary.skipped));
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }
    if summary.awaiting > 0 {
        parts.push(format!("{} awaiting confirmation", summary.awaiting));
    }
    let counts = parts.join(", ");

    if report.has_failures() {
        let failed: Vec<&str> = report
            .entries
            .iter()
            .filter(|e| e.outcome.is_failure())
            .map(|e| e.step_id.as_str())
            .collect();
        ui.error(&format!("Failed at: {} ({})", failed.join(", "), counts));
    } else if let Some(reason) = &report.aborted {
        ui.warning(&format!("Stopped: {} ({})", reason, counts));
    } else if report.dry_run {
        ui.success(&format!("Dry run complete ({})", counts));
    } else {
        ui.success(&format!("Done ({})", counts));
    }

    if ui.output_mode().shows_detail() {
        for entry in &report.entries {
            ui.message(&format!(
                "  {} {}: {}",
                outcome_symbol(&entry.outcome),
                entry.step_id,
                entry.outcome
            ));
        }
    }
}
