//! Dependency resolution
//!
//! Computes the set of local workspace packages a project needs and maps
//! each one to the directory it is installed from.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

use crate::core::lockfile::{DependencyRef, LockedPackage, LockfileDocument};
use crate::error::ResolverError;

/// How far local dependencies are followed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClosureMode {
    /// Only dependencies declared directly by the project
    ///
    /// A local package that is only reachable through another local
    /// package is not included.
    #[default]
    Direct,
    /// Follow local dependencies transitively
    Recursive,
}

/// Resolution options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Closure depth
    pub mode: ClosureMode,
    /// Also follow `dev-dependencies` groups
    pub include_dev: bool,
}

/// Local package name -> editable source directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectSourceMap(BTreeMap<String, PathBuf>);

impl ProjectSourceMap {
    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.0.iter()
    }

    /// Source path of a package
    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.0.get(name)
    }

    /// Package names
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Check whether a package is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of local packages
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve the local packages `project` depends on
///
/// The project itself is always part of the result, even when it is not
/// listed in `manifest.members`; every other key is a member. Only
/// structured dependency references naming a workspace member count as
/// local; bare names are treated as third-party.
pub fn resolve(
    lock: &LockfileDocument,
    project: &str,
    options: &ResolveOptions,
) -> Result<ProjectSourceMap, ResolverError> {
    let root = lock
        .package(project)
        .ok_or_else(|| ResolverError::ProjectNotFound {
            project: project.to_string(),
        })?;

    let closure = local_closure(lock, root, options);
    tracing::debug!(
        "Local closure of '{}': {}",
        project,
        closure.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    let mut sources = BTreeMap::new();
    for name in &closure {
        let package = lock
            .package(name)
            .ok_or_else(|| ResolverError::MissingLocalSource {
                package: name.clone(),
                source_kind: "missing".to_string(),
            })?;

        let path = package
            .source
            .editable_path()
            .ok_or_else(|| ResolverError::MissingLocalSource {
                package: name.clone(),
                source_kind: package.source.kind().to_string(),
            })?;

        sources.insert(name.clone(), path.clone());
    }

    Ok(ProjectSourceMap(sources))
}

fn local_closure(
    lock: &LockfileDocument,
    root: &LockedPackage,
    options: &ResolveOptions,
) -> BTreeSet<String> {
    let mut closure = BTreeSet::from([root.name.clone()]);
    let mut queue = VecDeque::from([root]);

    while let Some(package) = queue.pop_front() {
        let is_root = package.name == root.name;
        for name in local_dependencies(lock, package, options.include_dev && is_root) {
            if !closure.insert(name.to_string()) {
                continue;
            }
            if options.mode == ClosureMode::Recursive {
                if let Some(dep) = lock.package(name) {
                    queue.push_back(dep);
                }
            }
        }
    }

    closure
}

fn local_dependencies<'a>(
    lock: &'a LockfileDocument,
    package: &'a LockedPackage,
    include_dev: bool,
) -> impl Iterator<Item = &'a str> + 'a {
    let dev = package
        .dev_dependencies
        .values()
        .flatten()
        .filter(move |_| include_dev);

    package
        .dependencies
        .iter()
        .chain(dev)
        .filter_map(DependencyRef::structured_name)
        .filter(move |name| lock.is_member(name))
}
