//! Shell command execution for command-backed step actions.

pub mod command;
pub mod platform;

pub use command::{execute, CommandOptions, CommandResult};
pub use platform::{is_ci, shell_program};
