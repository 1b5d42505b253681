//! Error types for provisioning operations.
//!
//! This module defines [`ProvisionError`], the primary error type used
//! throughout the crate, [`ActionError`] for failures raised by step actions,
//! and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Registry and configuration errors are fatal and surface before any step runs
//! - Per-step [`ActionError`]s are recovered into the run report by the executor
//! - Use `anyhow::Error` (via `ProvisionError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A step with this id is already registered.
    #[error("Step '{id}' is already registered")]
    DuplicateStep { id: String },

    /// A requested step id is not registered.
    #[error("Unknown step: {id}")]
    UnknownStep { id: String },

    /// A step depends on a step that is not registered.
    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    /// The dependency graph contains a cycle.
    #[error("Dependency cycle detected: {}", .steps.join(" → "))]
    CycleDetected { steps: Vec<String> },

    /// A step action failed.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The step has no way to be reverted.
    #[error("Step '{step}' is not reversible")]
    NotReversible { step: String },

    /// The original path is occupied by content the caller has not allowed overwriting.
    #[error("Cannot restore {backup} to {path}: path is occupied by newer content")]
    RestoreConflict { path: PathBuf, backup: PathBuf },

    /// The backup a record points at no longer exists.
    #[error("Backup missing: {path}")]
    BackupMissing { path: PathBuf },

    /// A confirmation gate answered Cancel.
    #[error("Confirmation cancelled at step '{step}'")]
    ConfirmationCancelled { step: String },

    /// The user declined to continue.
    #[error("Operation cancelled by user")]
    UserCancelled,

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure raised by a step's check, apply, or revert.
///
/// The message is the wrapped tool's own error text and is shown to the
/// operator unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    /// Create an action error from the underlying failure text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ProvisionError> for ActionError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Action(inner) => inner,
            other => Self::new(other.to_string()),
        }
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
