//! Configuration schema definitions.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Root configuration structure for `.provision/config.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Machine or profile name (for display purposes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Global settings
    pub settings: Settings,

    /// Step definitions, in file order
    pub steps: StepMap,
}

/// Global settings that apply to every step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default output mode: verbose, normal, quiet, silent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_output: Option<OutputMode>,

    /// Where backups of overwritten paths are kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,

    /// Where run reports are written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<String>,

    /// Halt the remaining steps after the first failure
    #[serde(skip_serializing_if = "is_false")]
    pub stop_on_failure: bool,

    /// Environment variables passed to every command
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Output verbosity as written in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Verbose,
    Normal,
    Quiet,
    Silent,
}

/// Individual step configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Steps that must complete first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Probe for whether the step is already satisfied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckSpec>,

    /// Shell command that applies the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply: Option<String>,

    /// Shell command that reverts the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert: Option<String>,

    /// Symlink to manage instead of running commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkConfig>,

    /// Step overwrites pre-existing user state
    #[serde(skip_serializing_if = "is_false")]
    pub destructive: bool,

    /// Paths backed up before a destructive apply
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Step needs a human before it is applied
    #[serde(skip_serializing_if = "is_false")]
    pub interactive: bool,

    /// Text shown when waiting for the human
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Per-command timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Step-specific environment variables
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// A managed symlink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// What the link points to
    pub source: String,
    /// Where the link lives
    pub target: String,
}

/// Check to determine whether a step is already satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckSpec {
    /// Check if a file or directory exists
    FileExists {
        /// Path to check
        path: String,
    },

    /// Check if a command succeeds (exit code 0)
    CommandSucceeds {
        /// Command to run
        command: String,
    },

    /// Check if a path is a symlink to the expected destination
    Symlink {
        /// Link location
        path: String,
        /// Expected link destination
        points_to: String,
    },

    /// All checks must pass
    All {
        /// List of checks that must all pass
        checks: Vec<CheckSpec>,
    },

    /// Any check passing is sufficient
    Any {
        /// List of checks where at least one must pass
        checks: Vec<CheckSpec>,
    },
}

/// Step definitions keyed by id, kept in the order they appear in the file.
#[derive(Debug, Clone, Default)]
pub struct StepMap(Vec<(String, StepConfig)>);

impl StepMap {
    /// Iterate `(id, config)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StepConfig)> {
        self.0.iter().map(|(id, step)| (id, step))
    }

    /// Look up a step by id.
    pub fn get(&self, id: &str) -> Option<&StepConfig> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Check if a step id is defined.
    pub fn contains_key(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Append a step definition.
    pub fn insert(&mut self, id: impl Into<String>, step: StepConfig) {
        self.0.push((id.into(), step));
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no steps.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for StepMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StepMapVisitor;

        impl<'de> Visitor<'de> for StepMapVisitor {
            type Value = StepMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of step ids to step definitions")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<StepMap, E> {
                Ok(StepMap::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StepMap, A::Error> {
                let mut steps = StepMap::default();
                while let Some((id, step)) = map.next_entry::<String, StepConfig>()? {
                    if steps.contains_key(&id) {
                        return Err(A::Error::custom(format!("duplicate step '{}'", id)));
                    }
                    steps.insert(id, step);
                }
                Ok(steps)
            }
        }

        deserializer.deserialize_map(StepMapVisitor)
    }
}

impl Serialize for StepMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, step) in &self.0 {
            map.serialize_entry(id, step)?;
        }
        map.end()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config: ProvisionConfig = serde_yaml::from_str("app_name: laptop").unwrap();

        assert_eq!(config.app_name.as_deref(), Some("laptop"));
        assert!(config.steps.is_empty());
        assert!(!config.settings.stop_on_failure);
    }

    #[test]
    fn steps_keep_file_order() {
        let yaml = r#"
steps:
  zsh:
    apply: echo zsh
  brew:
    apply: echo brew
  git:
    apply: echo git
    depends_on: [brew]
"#;
        let config: ProvisionConfig = serde_yaml::from_str(yaml).unwrap();
        let ids: Vec<_> = config.steps.iter().map(|(id, _)| id.as_str()).collect();

        assert_eq!(ids, vec!["zsh", "brew", "git"]);
        assert_eq!(config.steps.get("git").unwrap().depends_on, vec!["brew"]);
    }

    #[test]
    fn parses_tagged_checks() {
        let yaml = r#"
type: all
checks:
  - type: file_exists
    path: ~/.ssh/id_ed25519
  - type: command_succeeds
    command: brew --version
  - type: symlink
    path: ~/.zshrc
    points_to: ~/dotfiles/zshrc
"#;
        let check: CheckSpec = serde_yaml::from_str(yaml).unwrap();

        match check {
            CheckSpec::All { checks } => {
                assert_eq!(checks.len(), 3);
                assert!(matches!(checks[2], CheckSpec::Symlink { .. }));
            }
            other => panic!("expected all, got {other:?}"),
        }
    }

    #[test]
    fn parses_link_and_flags() {
        let yaml = r#"
steps:
  zshrc:
    link:
      source: ~/dotfiles/zshrc
      target: ~/.zshrc
  ssh_key:
    interactive: true
    prompt: Paste the key into GitHub
    apply: pbcopy < ~/.ssh/id_ed25519.pub
"#;
        let config: ProvisionConfig = serde_yaml::from_str(yaml).unwrap();

        let zshrc = config.steps.get("zshrc").unwrap();
        assert_eq!(zshrc.link.as_ref().unwrap().target, "~/.zshrc");

        let key = config.steps.get("ssh_key").unwrap();
        assert!(key.interactive);
        assert_eq!(key.prompt.as_deref(), Some("Paste the key into GitHub"));
    }

    #[test]
    fn serializes_steps_in_order() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "b",
            StepConfig {
                apply: Some("echo b".to_string()),
                ..Default::default()
            },
        );
        config.steps.insert(
            "a",
            StepConfig {
                apply: Some("echo a".to_string()),
                ..Default::default()
            },
        );

        let yaml = serde_yaml::to_string(&config).unwrap();

        assert!(yaml.find("b:").unwrap() < yaml.find("a:").unwrap());
        assert!(!yaml.contains("destructive"));
    }
}
