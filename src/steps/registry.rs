//! Step registry.
//!
//! The registry holds every known [`Step`] and turns a requested subset into
//! a dependency-safe execution order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};
use crate::runner::dependency::DependencyGraph;

use super::step::Step;

/// Which way steps are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Dependencies before dependents (install).
    #[default]
    Forward,
    /// Dependents before dependencies (cleanup).
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// Holds the full set of steps in registration order.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
}

impl StepRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step.
    ///
    /// Fails with [`ProvisionError::DuplicateStep`] if the id is taken.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if self.index.contains_key(step.id()) {
            return Err(ProvisionError::DuplicateStep {
                id: step.id().to_string(),
            });
        }
        tracing::debug!(step = step.id(), "registered step");
        self.index.insert(step.id().to_string(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Look up a step by id.
    pub fn get(&self, id: &str) -> Option<&Step> {
        self.index.get(id).map(|&i| &self.steps[i])
    }

    /// Check if a step is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate steps in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Step ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.id().to_string()).collect()
    }

    /// Build the dependency graph over every registered step.
    pub fn graph(&self) -> Result<DependencyGraph> {
        self.steps
            .iter()
            .fold(DependencyGraph::builder(), |builder, step| {
                builder.add_step(step.id(), step.dependencies().iter().cloned())
            })
            .build()
    }

    /// Resolve a topologically valid execution order.
    ///
    /// An empty `step_ids` means every registered step. Otherwise the
    /// requested steps are widened in the direction of travel: `Forward`
    /// adds their transitive dependencies, `Reverse` their transitive
    /// dependents, so teardown never removes something a remaining step
    /// still needs. Over any set of steps, `Reverse` is exactly the
    /// `Forward` order reversed.
    pub fn resolve_order(&self, step_ids: &[String], direction: Direction) -> Result<Vec<String>> {
        let graph = self.graph()?;

        let mut order = match (step_ids.is_empty(), direction) {
            (true, _) => graph.topological_order()?,
            (false, Direction::Forward) => graph.order_including_dependencies(step_ids)?,
            (false, Direction::Reverse) => graph.order_including_dependents(step_ids)?,
        };

        if direction == Direction::Reverse {
            order.reverse();
        }

        tracing::debug!(%direction, order = ?order, "resolved step order");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::steps::{Action, SatisfactionState};

    #[derive(Debug)]
    struct Noop;

    impl Action for Noop {
        fn describe(&self) -> String {
            "noop".to_string()
        }

        fn check(&self) -> std::result::Result<SatisfactionState, ActionError> {
            Ok(SatisfactionState::NotSatisfied)
        }

        fn apply(&self) -> std::result::Result<(), ActionError> {
            Ok(())
        }
    }

    fn registry(steps: &[(&str, &[&str])]) -> StepRegistry {
        let mut registry = StepRegistry::new();
        for (id, deps) in steps {
            registry
                .register(Step::new(*id, Noop).depends_on(deps.iter().copied()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn register_rejects_duplicate() {
        let mut registry = registry(&[("a", &[])]);

        let err = registry.register(Step::new("a", Noop)).unwrap_err();

        assert!(matches!(err, ProvisionError::DuplicateStep { ref id } if id == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_all_in_forward_order() {
        let registry = registry(&[("c", &["a"]), ("b", &["a"]), ("a", &[])]);

        let order = registry.resolve_order(&[], Direction::Forward).unwrap();

        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn reverse_is_exact_reverse_of_forward() {
        let registry = registry(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b"])]);

        let mut forward = registry.resolve_order(&[], Direction::Forward).unwrap();
        let reverse = registry.resolve_order(&[], Direction::Reverse).unwrap();

        forward.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn resolve_subset_includes_dependencies() {
        let registry = registry(&[("a", &[]), ("b", &["a"]), ("c", &[])]);

        let order = registry
            .resolve_order(&["b".to_string()], Direction::Forward)
            .unwrap();

        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn reverse_subset_includes_dependents_only() {
        let registry = registry(&[("brew", &[]), ("git", &["brew"]), ("zsh", &["brew"])]);

        let git = registry
            .resolve_order(&["git".to_string()], Direction::Reverse)
            .unwrap();
        let brew = registry
            .resolve_order(&["brew".to_string()], Direction::Reverse)
            .unwrap();

        assert_eq!(git, vec!["git"]);
        assert_eq!(brew, vec!["zsh", "git", "brew"]);
    }

    #[test]
    fn resolve_reports_unknown_dependency() {
        let registry = registry(&[("a", &["ghost"])]);

        let err = registry.resolve_order(&[], Direction::Forward).unwrap_err();

        assert!(matches!(err, ProvisionError::UnknownDependency { .. }));
    }

    #[test]
    fn resolve_reports_cycle() {
        let registry = registry(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);

        let err = registry.resolve_order(&[], Direction::Forward).unwrap_err();

        match err {
            ProvisionError::CycleDetected { steps } => {
                assert!(steps.contains(&"a".to_string()));
                assert!(steps.contains(&"b".to_string()));
                assert!(!steps.contains(&"c".to_string()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn get_finds_registered_step() {
        let registry = registry(&[("a", &[])]);

        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
        assert_eq!(registry.ids(), vec!["a"]);
    }
}
