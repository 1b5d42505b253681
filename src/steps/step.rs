//! Step and action definitions.
//!
//! A [`Step`] is the atomic unit of provisioning. The engine never looks at
//! what a step does; it only talks to the step's [`Action`] through
//! `check`, `apply`, and `revert`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// Outcome of a side-effect-free `check` probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionState {
    /// The step's goal is already in place.
    AlreadySatisfied,
    /// The step needs to be applied.
    NotSatisfied,
    /// The probe could not tell either way.
    Unknown,
}

impl SatisfactionState {
    /// Whether this state lets the executor skip the step.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::AlreadySatisfied)
    }
}

impl fmt::Display for SatisfactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySatisfied => write!(f, "already satisfied"),
            Self::NotSatisfied => write!(f, "not satisfied"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Capability contract implemented by everything a step can do.
///
/// `apply` must be idempotent: calling it when the goal is already in place
/// is a no-op or safely repeatable.
pub trait Action: fmt::Debug {
    /// Short human-readable description of what `apply` does.
    fn describe(&self) -> String;

    /// Probe whether the step's goal is already in place.
    fn check(&self) -> Result<SatisfactionState, ActionError>;

    /// Bring the step's goal into place.
    fn apply(&self) -> Result<(), ActionError>;

    /// Undo what `apply` did.
    fn revert(&self) -> Result<(), ActionError> {
        Err(ActionError::new("action has no revert"))
    }

    /// Whether `revert` is implemented.
    fn is_reversible(&self) -> bool {
        false
    }
}

/// The atomic unit of provisioning.
#[derive(Debug)]
pub struct Step {
    id: String,
    title: Option<String>,
    depends_on: Vec<String>,
    destructive: bool,
    targets: Vec<PathBuf>,
    interactive: bool,
    prompt: Option<String>,
    action: Box<dyn Action>,
}

impl Step {
    /// Create a step with no dependencies that is neither destructive nor interactive.
    pub fn new(id: impl Into<String>, action: impl Action + 'static) -> Self {
        Self::from_boxed(id, Box::new(action))
    }

    /// Create a step from an already boxed action.
    pub fn from_boxed(id: impl Into<String>, action: Box<dyn Action>) -> Self {
        Self {
            id: id.into(),
            title: None,
            depends_on: Vec::new(),
            destructive: false,
            targets: Vec::new(),
            interactive: false,
            prompt: None,
            action,
        }
    }

    /// Set a human-readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare the steps that must complete before this one.
    ///
    /// Duplicates are dropped; declared order is kept.
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.depends_on.contains(&id) {
                self.depends_on.push(id);
            }
        }
        self
    }

    /// Mark the step destructive: each target is backed up before `apply`.
    pub fn destructive<I, P>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.destructive = true;
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    /// Mark the step interactive: the executor waits for confirmation before `apply`.
    pub fn interactive(mut self, prompt: Option<String>) -> Self {
        self.interactive = true;
        self.prompt = prompt;
        self
    }

    /// Unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title if set, otherwise the action's description.
    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.action.describe())
    }

    /// Ids of the steps this one depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    /// Whether the step overwrites pre-existing user state.
    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    /// Paths backed up before a destructive `apply`.
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Whether the step needs a human before `apply`.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Text shown at the confirmation gate.
    pub fn prompt(&self) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(|| format!("Continue with '{}'?", self.title()))
    }

    /// The step's action.
    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }
}
