//! provision - Declarative, idempotent machine setup.
//!
//! Steps are declared in YAML, checked before they run, applied in
//! dependency order, and reverted in the opposite order. Anything a
//! destructive step would overwrite is moved into a timestamped backup
//! first and restored on cleanup.
//!
//! # Modules
//!
//! - [`backup`] - Timestamped backups and restores
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Executor, confirmation gates, and run reports
//! - [`shell`] - Shell command execution
//! - [`steps`] - Steps, actions, and the step registry
//! - [`ui`] - Prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use provision::backup::BackupManager;
//! use provision::runner::{Executor, RunOptions, ScriptedGate};
//! use provision::steps::{CommandAction, Direction, Step, StepRegistry};
//! use provision::ui::MockUI;
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let mut registry = StepRegistry::new();
//! registry
//!     .register(Step::new("noop", CommandAction::new("true", temp.path())))
//!     .unwrap();
//!
//! let order = registry.resolve_order(&[], Direction::Forward).unwrap();
//! let mut backups = BackupManager::new(temp.path().join("backups"));
//! let report = Executor::new(&registry, &mut backups)
//!     .run(
//!         &order,
//!         &RunOptions::default(),
//!         &mut ScriptedGate::proceed(),
//!         &mut MockUI::new(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(report.exit_code(), 0);
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{ProvisionError, Result};
