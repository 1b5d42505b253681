//! Run reports.
//!
//! Every executor invocation produces one [`RunReport`]: the ordered list of
//! what happened to each step. The report is written as JSON lines (a header
//! line followed by one [`ReportEntry`] per line) so it can be grepped or
//! streamed into other tools.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::steps::Direction;

/// Why a step did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The step's goal was already in place.
    AlreadySatisfied,
    /// A dependency (forward) or dependent (reverse) failed or was blocked.
    Blocked { by: String },
    /// An earlier failure stopped the run.
    Halted,
    /// Reverse mode and the step's goal is not in place.
    NothingToRevert,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySatisfied => write!(f, "already satisfied"),
            Self::Blocked { by } => write!(f, "blocked by '{}'", by),
            Self::Halted => write!(f, "halted after earlier failure"),
            Self::NothingToRevert => write!(f, "nothing to revert"),
        }
    }
}

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// The action's own error text, unmodified.
    Action(String),
    /// The step has no revert and no backup to restore.
    NotReversible,
    /// A backup could not be put back.
    RestoreConflict(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(text) => write!(f, "{}", text),
            Self::NotReversible => write!(f, "not reversible"),
            Self::RestoreConflict(text) => write!(f, "{}", text),
        }
    }
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Skipped(SkipReason),
    Applied,
    /// Dry run: what would have been done.
    DryRun { action: String },
    Failed(FailureReason),
    /// The confirmation gate answered Cancel.
    AwaitingConfirmation,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether steps depending on this one must not run.
    pub fn blocks_others(&self) -> bool {
        matches!(
            self,
            Self::Failed(_)
                | Self::Skipped(SkipReason::Blocked { .. })
                | Self::AwaitingConfirmation
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Applied => write!(f, "applied"),
            Self::DryRun { action } => write!(f, "would run: {}", action),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            Self::AwaitingConfirmation => write!(f, "awaiting confirmation"),
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub step_id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

/// Tally of outcomes in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: usize,
    pub awaiting: usize,
}

/// The result of one executor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub direction: Direction,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the run stopped before reaching the end of its order.
    pub aborted: Option<String>,
    pub entries: Vec<ReportEntry>,
}

/// Header line of a JSON-lines report.
#[derive(Serialize)]
struct ReportHeader<'a> {
    direction: Direction,
    dry_run: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    aborted: Option<&'a str>,
    steps: usize,
}

impl RunReport {
    pub fn new(direction: Direction, dry_run: bool) -> Self {
        Self {
            direction,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            aborted: None,
            entries: Vec::new(),
        }
    }

    /// Append an entry stamped with the current time.
    pub fn record(&mut self, step_id: impl Into<String>, outcome: Outcome) {
        self.entries.push(ReportEntry {
            step_id: step_id.into(),
            outcome,
            timestamp: Utc::now(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// The entry recorded for `step_id`, if any.
    pub fn entry(&self, step_id: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.step_id == step_id)
    }

    /// The outcome recorded for `step_id`, if any.
    pub fn outcome(&self, step_id: &str) -> Option<&Outcome> {
        self.entry(step_id).map(|e| &e.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_failure())
    }

    /// Process exit code for this report: 1 if anything failed.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Applied => summary.applied += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::Failed(_) => summary.failed += 1,
                Outcome::DryRun { .. } => summary.dry_run += 1,
                Outcome::AwaitingConfirmation => summary.awaiting += 1,
            }
        }
        summary
    }

    /// Render the report as JSON lines.
    pub fn to_jsonl(&self) -> Result<String> {
        let header = ReportHeader {
            direction: self.direction,
            dry_run: self.dry_run,
            started_at: self.started_at,
            finished_at: self.finished_at,
            aborted: self.aborted.as_deref(),
            steps: self.entries.len(),
        };

        let mut out = serde_json::to_string(&header).map_err(anyhow::Error::from)?;
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry).map_err(anyhow::Error::from)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the report to `<dir>/<timestamp>-<install|cleanup>.jsonl`.
    pub fn write_jsonl(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let kind = match self.direction {
            Direction::Forward => "install",
            Direction::Reverse => "cleanup",
        };
        let name = format!(
            "{}-{}.jsonl",
            self.started_at.format("%Y%m%dT%H%M%S%.6fZ"),
            kind
        );
        let path = dir.join(name);

        let mut file = std::fs::File::create(&path)?;
        file.write_all(self.to_jsonl()?.as_bytes())?;
        tracing::debug!(destination = %path.display(), "wrote run report");
        Ok(path)
    }
}

/// Default directory for run reports: `~/.provision/reports`.
pub fn default_report_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".provision")
        .join("reports")
}
