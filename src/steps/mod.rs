//! Steps, actions, and the step registry.
//!
//! This module provides the building blocks the executor runs:
//!
//! - [`Step`] - The atomic unit of provisioning
//! - [`Action`] - The check/apply/revert contract every step delegates to
//! - [`StepRegistry`] - Holds steps and resolves dependency-safe orders
//! - [`CommandAction`] and [`LinkAction`] - Built-in actions used by config files
//!
//! # Example
//!
//! ```
//! use provision::steps::{CommandAction, Direction, Step, StepRegistry};
//!
//! let mut registry = StepRegistry::new();
//! registry.register(Step::new("brew", CommandAction::new("true", "."))).unwrap();
//! registry
//!     .register(Step::new("git", CommandAction::new("true", ".")).depends_on(["brew"]))
//!     .unwrap();
//!
//! let order = registry.resolve_order(&[], Direction::Reverse).unwrap();
//! assert_eq!(order, vec!["git", "brew"]);
//! ```

pub mod check;
pub mod command_action;
pub mod link_action;
pub mod paths;
pub mod registry;
pub mod step;

pub use check::{run_check, CheckResult};
pub use command_action::CommandAction;
pub use link_action::LinkAction;
pub use paths::expand_path;
pub use registry::{Direction, StepRegistry};
pub use step::{Action, SatisfactionState, Step};
