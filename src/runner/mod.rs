//! Step execution orchestration.

pub mod dependency;
pub mod executor;
pub mod gate;
pub mod report;

pub use dependency::{DependencyGraph, DependencyGraphBuilder};
pub use executor::{Executor, RunOptions, StepState};
pub use gate::{ConfirmationGate, ConfirmationRequest, Decision, EnvGate, PromptGate, ScriptedGate};
pub use report::{
    default_report_dir, FailureReason, Outcome, ReportEntry, ReportSummary, RunReport, SkipReason,
};
