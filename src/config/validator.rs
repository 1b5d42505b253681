//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Steps must have exactly one of `apply` or `link`
//! - `link` steps manage their own check and revert
//! - `depends_on` must reference existing steps
//! - Destructive steps must name what they overwrite
//! - No circular dependencies allowed

use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use crate::runner::DependencyGraph;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step id if the error is step-specific
    pub step: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, step: Option<&str>, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            step: step.map(String::from),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// All rules run so users can fix every issue at once.
pub fn validate_config(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_steps(config));
    errors.extend(validate_dependencies(config));

    errors
}

fn validate_steps(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (id, step) in config.steps.iter() {
        let id = id.as_str();

        match (&step.apply, &step.link) {
            (None, None) => errors.push(ValidationError::new(
                "missing-action",
                Some(id),
                format!("Step '{}' must have either 'apply' or 'link'", id),
            )),
            (Some(_), Some(_)) => errors.push(ValidationError::new(
                "conflicting-action",
                Some(id),
                format!("Step '{}' cannot have both 'apply' and 'link'", id),
            )),
            _ => {}
        }

        if step.link.is_some() && (step.revert.is_some() || step.check.is_some()) {
            errors.push(ValidationError::new(
                "link-with-commands",
                Some(id),
                format!(
                    "Step '{}' is a link; it cannot also set 'check' or 'revert'",
                    id
                ),
            ));
        }

        if step.destructive && step.link.is_none() && step.targets.is_empty() {
            errors.push(ValidationError::new(
                "destructive-without-targets",
                Some(id),
                format!("Step '{}' is destructive but lists no 'targets'", id),
            ));
        }

        if !step.destructive && !step.targets.is_empty() {
            errors.push(ValidationError::new(
                "targets-without-destructive",
                Some(id),
                format!(
                    "Step '{}' lists 'targets' but is not marked 'destructive'",
                    id
                ),
            ));
        }

        if step.depends_on.iter().any(|dep| dep == id) {
            errors.push(ValidationError::new(
                "self-dependency",
                Some(id),
                format!("Step '{}' depends on itself", id),
            ));
        }

        for dep in &step.depends_on {
            if !config.steps.contains_key(dep) {
                errors.push(ValidationError::new(
                    "unknown-step",
                    Some(id),
                    format!("Step '{}' depends on '{}' which does not exist", id, dep),
                ));
            }
        }
    }

    errors
}

/// Report one dependency cycle, if any.
///
/// Unknown and self dependencies are reported by [`validate_steps`] and left
/// out of the graph here.
fn validate_dependencies(config: &ProvisionConfig) -> Vec<ValidationError> {
    let graph = config
        .steps
        .iter()
        .fold(DependencyGraph::builder(), |builder, (id, step)| {
            let deps = step
                .depends_on
                .iter()
                .filter(|dep| *dep != id && config.steps.contains_key(dep))
                .cloned();
            builder.add_step(id.as_str(), deps)
        })
        .build();

    match graph.and_then(|g| g.topological_order()) {
        Err(ProvisionError::CycleDetected { steps }) => vec![ValidationError::new(
            "circular-dependency",
            steps.first().map(String::as_str),
            format!("Circular dependency detected: {}", steps.join(" → ")),
        )],
        _ => Vec::new(),
    }
}

/// Validate and return a single error listing every problem.
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &ProvisionConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(ProvisionError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LinkConfig, StepConfig};

    fn apply(cmd: &str) -> StepConfig {
        StepConfig {
            apply: Some(cmd.to_string()),
            ..Default::default()
        }
    }

    fn rules(config: &ProvisionConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.rule).collect()
    }

    #[test]
    fn requires_apply_or_link() {
        let mut config = ProvisionConfig::default();
        config.steps.insert("empty", StepConfig::default());

        assert_eq!(rules(&config), vec!["missing-action"]);
    }

    #[test]
    fn rejects_apply_and_link_together() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "both",
            StepConfig {
                apply: Some("echo".into()),
                link: Some(LinkConfig {
                    source: "a".into(),
                    target: "b".into(),
                }),
                ..Default::default()
            },
        );

        assert!(rules(&config).contains(&"conflicting-action".to_string()));
    }

    #[test]
    fn destructive_needs_targets() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "wipe",
            StepConfig {
                destructive: true,
                ..apply("rm -rf ~/.cache/thing")
            },
        );

        assert_eq!(rules(&config), vec!["destructive-without-targets"]);
    }

    #[test]
    fn link_steps_are_destructive_without_targets() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "zshrc",
            StepConfig {
                destructive: true,
                link: Some(LinkConfig {
                    source: "~/dotfiles/zshrc".into(),
                    target: "~/.zshrc".into(),
                }),
                ..Default::default()
            },
        );

        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn validates_depends_on_exists() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "git",
            StepConfig {
                depends_on: vec!["brew".into()],
                ..apply("echo git")
            },
        );

        assert_eq!(rules(&config), vec!["unknown-step"]);
    }

    #[test]
    fn detects_circular_dependency() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "a",
            StepConfig {
                depends_on: vec!["b".into()],
                ..apply("a")
            },
        );
        config.steps.insert(
            "b",
            StepConfig {
                depends_on: vec!["a".into()],
                ..apply("b")
            },
        );

        let errors = validate_config(&config);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "circular-dependency");
        assert!(errors[0].message.contains('a'));
        assert!(errors[0].message.contains('b'));
    }

    #[test]
    fn self_dependency_is_reported_once() {
        let mut config = ProvisionConfig::default();
        config.steps.insert(
            "a",
            StepConfig {
                depends_on: vec!["a".into()],
                ..apply("a")
            },
        );

        assert_eq!(rules(&config), vec!["self-dependency"]);
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProvisionConfig::default();
        config.steps.insert("empty", StepConfig::default());
        config.steps.insert(
            "orphan",
            StepConfig {
                depends_on: vec!["ghost".into()],
                ..apply("x")
            },
        );

        let err = validate(&config).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("'empty'"));
        assert!(msg.contains("'ghost'"));
    }

    #[test]
    fn valid_config_returns_no_errors() {
        let mut config = ProvisionConfig::default();
        config.steps.insert("a", apply("a"));
        config.steps.insert(
            "b",
            StepConfig {
                depends_on: vec!["a".into()],
                destructive: true,
                targets: vec!["~/.gitconfig".into()],
                ..apply("b")
            },
        );

        assert!(validate(&config).is_ok());
    }
}
