//! Configuration file discovery and loading.
//!
//! A project keeps its steps in `.provision/config.yml`. An optional
//! `.provision/config.local.yml` next to it is deep-merged on top, so a
//! single machine can tweak shared steps without editing the shared file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::merger::merge_configs;
use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};

/// Directory holding the project configuration.
pub const CONFIG_DIR: &str = ".provision";

/// Paths to configuration files in merge order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .provision/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .provision/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// All existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    /// Check if the project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Where the project config is expected to live.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.yml")
}

/// Find the project root by walking up from `start`.
///
/// Looks for a `.provision` directory first, then falls back to `.git`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProvisionError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProvisionError::Io(e)
        }
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ProvisionConfig> {
    let content = read(path)?;
    parse_config(&content, path)
}

/// Parse YAML content. `source_path` is used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ProvisionConfig> {
    serde_yaml::from_str(content).map_err(|e| ProvisionError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = read(path)?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ProvisionError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // An empty file parses as null; treat it as an empty layer.
    if value.is_null() {
        Ok(serde_yaml::Value::Mapping(Default::default()))
    } else {
        Ok(value)
    }
}

/// Load the project config with local overrides merged on top.
///
/// # Errors
///
/// Returns `ConfigNotFound` if there is no `.provision/config.yml`.
/// Returns `ConfigParseError` if any layer is invalid.
pub fn load_merged_config(project_root: &Path) -> Result<ProvisionConfig> {
    let paths = ConfigPaths::discover(project_root);
    let project_path = project_config_path(project_root);

    if !paths.has_project_config() {
        return Err(ProvisionError::ConfigNotFound { path: project_path });
    }

    let mut layers = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!(source = %path.display(), "loading config layer");
        layers.push(load_config_value(path)?);
    }

    let merged = merge_configs(&layers);
    serde_yaml::from_value(merged).map_err(|e| ProvisionError::ConfigParseError {
        path: project_path,
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with an optional path override.
///
/// An explicit path is loaded on its own, without local overrides.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<ProvisionConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(project_root),
    }
}
