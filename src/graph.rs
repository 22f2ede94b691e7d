//! Module dependency graph and dependency-first ordering.

use crate::scan::ModuleInfo;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Edges `module -> import` restricted to imports that name a project module.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: IndexMap<String, Vec<String>>,
}

/// Error type for graph operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Import cycle, listed in import order and closed by repeating its first module
    Cycle { path: Vec<String> },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Cycle { path } => {
                write!(f, "Import cycle detected: {}", path.join(" -> "))
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// DFS bookkeeping, owned by a single `topological_order` call.
#[derive(Default)]
struct TraversalState<'g> {
    marks: HashMap<&'g str, Mark>,
    path: Vec<&'g str>,
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn from_modules(modules: &IndexMap<String, ModuleInfo>) -> Self {
        Self::from_edges(
            modules
                .values()
                .map(|m| (m.name.as_str(), m.imports.iter().map(String::as_str))),
        )
    }

    /// Builds a graph from `(module, imports)` pairs; unknown imports are dropped.
    pub fn from_edges<'a, I, D>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let raw: Vec<(&str, Vec<&str>)> = edges
            .into_iter()
            .map(|(name, deps)| (name, deps.into_iter().collect()))
            .collect();

        let mut nodes: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, _) in &raw {
            nodes.entry(name.to_string()).or_default();
        }
        let mut assigned = HashSet::new();
        for (name, deps) in raw {
            // first declaration of a name wins
            if !assigned.insert(name) {
                continue;
            }
            let known: Vec<String> = deps
                .into_iter()
                .filter(|dep| nodes.contains_key(*dep))
                .map(str::to_string)
                .collect();
            nodes.insert(name.to_string(), known);
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Module names in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Known imports of `name`, in declaration order.
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.nodes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Modules that import `name` directly.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d == name))
            .map(|(m, _)| m.as_str())
            .collect()
    }

    /// Every module exactly once, each after all of its imports.
    ///
    /// Depth-first post-order seeded in discovery order, so the result is
    /// deterministic for a given scan.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut state = TraversalState::default();
        for name in self.nodes.keys() {
            self.visit(name, &mut state)?;
        }
        Ok(state.order)
    }

    fn visit<'g>(&'g self, name: &'g str, state: &mut TraversalState<'g>) -> Result<(), GraphError> {
        match state.marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = state.path.iter().position(|m| *m == name).unwrap_or(0);
                let mut path: Vec<String> =
                    state.path[start..].iter().map(|m| m.to_string()).collect();
                path.push(name.to_string());
                return Err(GraphError::Cycle { path });
            }
            None => {}
        }

        state.marks.insert(name, Mark::InProgress);
        state.path.push(name);

        for dep in self.dependencies(name) {
            self.visit(dep, state)?;
        }

        state.path.pop();
        state.marks.insert(name, Mark::Done);
        state.order.push(name.to_string());
        Ok(())
    }
}
