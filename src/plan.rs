//! Stale-set computation against the build cache.

use crate::cache::BuildCache;
use crate::config::BuildSettings;
use crate::graph::DependencyGraph;
use crate::scan::ScanResult;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// Checksum differs from the cache, or the module is new.
    Changed,
    /// An imported module is being rebuilt.
    DependencyStale(String),
    /// The module's `.pcm` is gone from disk.
    MissingArtifact,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Changed => write!(f, "source changed"),
            StaleReason::DependencyStale(dep) => write!(f, "import '{}' is rebuilt", dep),
            StaleReason::MissingArtifact => write!(f, "artifact missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReason {
    MissingExecutable,
    EntryChanged,
    ModulesRebuilt,
}

impl fmt::Display for LinkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkReason::MissingExecutable => write!(f, "executable missing"),
            LinkReason::EntryChanged => write!(f, "entry file changed"),
            LinkReason::ModulesRebuilt => write!(f, "modules rebuilt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedModule {
    pub name: String,
    /// `None` when the module is fresh.
    pub stale: Option<StaleReason>,
}

impl PlannedModule {
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

/// Topological order annotated with fresh/stale flags, valid for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub modules: Vec<PlannedModule>,
    pub link: Option<LinkReason>,
}

impl BuildPlan {
    pub fn stale_modules(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter(|m| m.is_stale())
            .map(|m| m.name.as_str())
    }

    pub fn is_stale(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m.name == module && m.is_stale())
    }

    pub fn needs_link(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_up_to_date(&self) -> bool {
        !self.needs_link() && self.stale_modules().next().is_none()
    }
}

/// Marks stale modules in one forward pass over `order`.
///
/// A module is stale when its checksum changed, when one of its imports is
/// stale, or when its artifact is missing. `order` must be dependency-first,
/// which makes every import's flag final before its dependents are checked.
pub fn plan_build(
    scan: &ScanResult,
    graph: &DependencyGraph,
    order: &[String],
    cache: &BuildCache,
    settings: &BuildSettings,
) -> BuildPlan {
    let mut stale: HashSet<&str> = HashSet::new();
    let mut modules = Vec::with_capacity(order.len());

    for name in order {
        let current = scan.modules.get(name).map(|m| m.checksum.as_str());
        let changed = current.is_none() || cache.checksum_of(name) != current;

        let reason = if changed {
            Some(StaleReason::Changed)
        } else if let Some(dep) = graph
            .dependencies(name)
            .iter()
            .find(|dep| stale.contains(dep.as_str()))
        {
            Some(StaleReason::DependencyStale(dep.clone()))
        } else if !settings.artifact_path(name).exists() {
            Some(StaleReason::MissingArtifact)
        } else {
            None
        };

        if reason.is_some() {
            stale.insert(name.as_str());
        }
        modules.push(PlannedModule {
            name: name.clone(),
            stale: reason,
        });
    }

    let link = if !settings.executable_path().exists() {
        Some(LinkReason::MissingExecutable)
    } else if scan.entry_checksum != cache.entry_checksum {
        Some(LinkReason::EntryChanged)
    } else if !stale.is_empty() {
        Some(LinkReason::ModulesRebuilt)
    } else {
        None
    };

    BuildPlan { modules, link }
}
