//! Dependency graph for step execution ordering.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::{ProvisionError, Result};

/// Represents the dependency relationships between steps.
///
/// Steps keep the order in which they were added; that order breaks ties
/// whenever several steps are ready at once, so every ordering the graph
/// produces is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Step names in insertion order.
    steps: Vec<String>,
    /// Map of step name to its position in `steps`.
    index: HashMap<String, usize>,
    /// Map of step name to its direct dependencies, in declared order.
    dependencies: HashMap<String, Vec<String>>,
    /// Map of step name to steps that depend on it.
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Get the direct dependencies of a step.
    pub fn dependencies_of(&self, step: &str) -> Option<&[String]> {
        self.dependencies.get(step).map(Vec::as_slice)
    }

    /// Get steps that depend on the given step.
    pub fn dependents_of(&self, step: &str) -> Option<&[String]> {
        self.dependents.get(step).map(Vec::as_slice)
    }

    /// Check if a step exists in the graph.
    pub fn contains(&self, step: &str) -> bool {
        self.index.contains_key(step)
    }

    /// Get all step names in insertion order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Get the number of steps in the graph.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns all steps in topological order (dependencies before dependents).
    ///
    /// Returns [`ProvisionError::CycleDetected`] if no valid order exists.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let all: HashSet<&str> = self.steps.iter().map(String::as_str).collect();
        self.order_subset(&all)
    }

    /// Returns the given steps plus everything they depend on, in topological order.
    pub fn order_including_dependencies(&self, requested: &[String]) -> Result<Vec<String>> {
        self.order_closed_over(requested, Self::transitive_dependencies)
    }

    /// Returns the given steps plus everything that depends on them, in
    /// topological order.
    pub fn order_including_dependents(&self, requested: &[String]) -> Result<Vec<String>> {
        self.order_closed_over(requested, Self::transitive_dependents)
    }

    fn order_closed_over(
        &self,
        requested: &[String],
        related: fn(&Self, &str) -> HashSet<String>,
    ) -> Result<Vec<String>> {
        let mut subset: HashSet<&str> = HashSet::new();
        for step in requested {
            if !self.contains(step) {
                return Err(ProvisionError::UnknownStep { id: step.clone() });
            }
            subset.insert(step.as_str());
            for other in related(self, step) {
                if let Some((name, _)) = self.index.get_key_value(other.as_str()) {
                    subset.insert(name.as_str());
                }
            }
        }
        self.order_subset(&subset)
    }

    /// Kahn's algorithm over a closed subset of the graph.
    fn order_subset(&self, subset: &HashSet<&str>) -> Result<Vec<String>> {
        // Count incoming edges from inside the subset
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for step in subset {
            let degree = self
                .dependencies
                .get(*step)
                .map_or(0, |deps| deps.iter().filter(|d| subset.contains(d.as_str())).count());
            in_degree.insert(*step, degree);
        }

        // Ready steps come out lowest insertion index first
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(step, _)| Reverse(self.index[*step]))
            .collect();

        let mut result = Vec::with_capacity(subset.len());

        while let Some(Reverse(idx)) = ready.pop() {
            let step = &self.steps[idx];
            result.push(step.clone());

            if let Some(dependents) = self.dependents.get(step) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.push(Reverse(self.index[dependent]));
                        }
                    }
                }
            }
        }

        // If we haven't processed all nodes, there's a cycle
        if result.len() != subset.len() {
            let steps = self.find_cycle().unwrap_or_else(|| {
                let mut remaining: Vec<String> = in_degree
                    .iter()
                    .filter(|(_, &d)| d > 0)
                    .map(|(s, _)| s.to_string())
                    .collect();
                remaining.sort_by_key(|s| self.index[s]);
                remaining
            });
            return Err(ProvisionError::CycleDetected { steps });
        }

        Ok(result)
    }

    /// Find a cycle in the graph, returning the path if one exists.
    ///
    /// The path starts and ends with the same step, e.g. `["a", "b", "a"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node);

            if let Some(deps) = graph.dependencies.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| *s == dep.as_str())?;
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|s| s.to_string()).collect();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) | None => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: HashMap<&str, State> = self
            .steps
            .iter()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();
        let mut path: Vec<&str> = Vec::new();

        for step in &self.steps {
            if state.get(step.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(step, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Get all transitive dependencies of a step.
    pub fn transitive_dependencies(&self, step: &str) -> HashSet<String> {
        walk(&self.dependencies, step)
    }

    /// Get all steps that transitively depend on a step.
    pub fn transitive_dependents(&self, step: &str) -> HashSet<String> {
        walk(&self.dependents, step)
    }
}

fn walk(edges: &HashMap<String, Vec<String>>, start: &str) -> HashSet<String> {
    let mut result = HashSet::new();
    let mut to_visit = vec![start.to_string()];

    while let Some(current) = to_visit.pop() {
        if let Some(next) = edges.get(&current) {
            for other in next {
                if result.insert(other.clone()) {
                    to_visit.push(other.clone());
                }
            }
        }
    }

    result
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    steps: Vec<(String, Vec<String>)>,
}

impl DependencyGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with its dependencies.
    pub fn add_step<I, S>(mut self, name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .push((name.into(), depends_on.into_iter().map(Into::into).collect()));
        self
    }

    /// Build the dependency graph.
    ///
    /// Returns an error if a step is added twice or any dependency
    /// references a non-existent step.
    pub fn build(self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::default();

        for (name, _) in &self.steps {
            if graph.index.contains_key(name) {
                return Err(ProvisionError::DuplicateStep { id: name.clone() });
            }
            graph.index.insert(name.clone(), graph.steps.len());
            graph.steps.push(name.clone());
            graph.dependents.insert(name.clone(), Vec::new());
        }

        for (name, deps) in self.steps {
            let mut unique: Vec<String> = Vec::with_capacity(deps.len());
            for dep in deps {
                if !graph.index.contains_key(&dep) {
                    return Err(ProvisionError::UnknownDependency {
                        step: name,
                        dependency: dep,
                    });
                }
                if !unique.contains(&dep) {
                    unique.push(dep);
                }
            }
            for dep in &unique {
                if let Some(dependents) = graph.dependents.get_mut(dep) {
                    dependents.push(name.clone());
                }
            }
            graph.dependencies.insert(name, unique);
        }

        Ok(graph)
    }
}
