//! Configuration loading, parsing, and validation.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layer merging in [`merger`]
//! - Validation in [`validator`]
//! - Building a step registry in [`build`]
//!
//! # Example
//!
//! ```
//! use provision::config::{build_registry, load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".provision");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(
//!     dir.join("config.yml"),
//!     "app_name: laptop\nsteps:\n  brew:\n    apply: echo brew\n",
//! )
//! .unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! let registry = build_registry(&config, temp.path()).unwrap();
//! assert_eq!(registry.ids(), vec!["brew"]);
//! ```
//!
//! # Configuration File Locations
//!
//! 1. Project config (`.provision/config.yml`)
//! 2. Local overrides (`.provision/config.local.yml`), merged on top

pub mod build;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use build::{backup_dir, build_registry, default_backup_dir, report_dir};
pub use loader::{
    find_project_root, load_config, load_config_file, load_merged_config, parse_config,
    project_config_path, ConfigPaths,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{
    CheckSpec, LinkConfig, OutputMode, ProvisionConfig, Settings, StepConfig, StepMap,
};
pub use validator::{validate, validate_config, ValidationError};
