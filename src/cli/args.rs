//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Provision - Declarative, reversible machine setup.
#[derive(Debug, Parser)]
#[command(name = "provision")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .provision/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never prompt; answer confirmations from PROVISION_CONFIRM_* variables
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bring every step into place
    Install(InstallArgs),

    /// Revert steps in reverse dependency order
    Cleanup(CleanupArgs),

    /// List configured steps in install order
    List,

    /// Show backups kept on disk
    Backups(BackupsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Check steps and show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Install only these steps and their dependencies (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Skip remaining steps after the first failure
    #[arg(long)]
    pub stop_on_failure: bool,
}

/// Arguments for the `cleanup` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CleanupArgs {
    /// Revert only these steps and the steps that depend on them (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Back up whatever occupies a restore target instead of refusing
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `backups` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BackupsArgs {
    /// Only show backups of this path
    pub path: Option<PathBuf>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
