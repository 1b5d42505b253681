//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`provision install`, `provision cleanup`)
//! - Shared project loading in [`project`]
//! - Consistent global flag handling

pub mod backups;
pub mod cleanup;
pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod install;
pub mod list;
pub mod project;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
