//! Build handle values
//!
//! A [`Container`] describes an image as a Dockerfile build followed by an
//! ordered list of operations. Nothing is executed here; a
//! [`crate::infra::docker::BuildEngine`] turns the description into an image.
//!
//! Every transforming method consumes the value and returns the new one, so
//! the caller always rebinds:
//!
//! ```
//! use uvstage::core::container::{Container, Directory, DockerBuild};
//!
//! let base = DockerBuild::new(Directory::new(), "Dockerfile", "deps-dev");
//! let container = Container::docker_build(base)
//!     .with_new_directory("libs/core")
//!     .with_exec(["uv", "sync"]);
//! assert_eq!(container.ops().len(), 2);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::infra::repo::IgnorePatterns;

/// A subtree of the repository checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostTree {
    /// Absolute path on the host
    pub path: PathBuf,
    /// Patterns excluded when the tree is copied
    #[serde(skip)]
    pub ignore: IgnorePatterns,
}

/// Entry of a build context directory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextEntry {
    /// A file with inline contents
    File { contents: String },
    /// A host subtree
    Tree { tree: HostTree },
}

/// A build context: relative path -> entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Directory {
    entries: BTreeMap<PathBuf, ContextEntry>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.entries.insert(
            path.into(),
            ContextEntry::File {
                contents: contents.into(),
            },
        );
        self
    }

    /// Add (or replace) a host subtree
    #[must_use]
    pub fn with_directory(mut self, path: impl Into<PathBuf>, tree: HostTree) -> Self {
        self.entries.insert(path.into(), ContextEntry::Tree { tree });
        self
    }

    /// Entries in path order
    pub fn entries(&self) -> impl Iterator<Item = (&PathBuf, &ContextEntry)> {
        self.entries.iter()
    }

    /// Look up an entry
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&ContextEntry> {
        self.entries.get(path.as_ref())
    }

    /// Whether any entry is a host subtree
    pub fn contains_tree(&self) -> bool {
        self.entries
            .values()
            .any(|e| matches!(e, ContextEntry::Tree { .. }))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A multi-stage Dockerfile build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerBuild {
    /// Build context
    pub context: Directory,
    /// Dockerfile path, relative to the context
    pub dockerfile: PathBuf,
    /// Stage to build
    pub target: String,
    /// `--build-arg` values
    pub build_args: BTreeMap<String, String>,
}

impl DockerBuild {
    /// Create a build with no build arguments
    pub fn new(context: Directory, dockerfile: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            context,
            dockerfile: dockerfile.into(),
            target: target.into(),
            build_args: BTreeMap::new(),
        }
    }

    /// Add a build argument
    #[must_use]
    pub fn with_build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.insert(key.into(), value.into());
        self
    }
}

/// An operation applied on top of the base image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ContainerOp {
    /// Create an empty directory (and parents)
    NewDirectory { path: PathBuf },
    /// Write a file
    File { path: PathBuf, contents: String },
    /// Copy a host subtree over a directory
    Directory { path: PathBuf, tree: HostTree },
    /// Run a command
    Exec { args: Vec<String> },
}

/// An image description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    base: DockerBuild,
    ops: Vec<ContainerOp>,
}

impl Container {
    /// Start from a Dockerfile build
    pub fn docker_build(base: DockerBuild) -> Self {
        Self {
            base,
            ops: Vec::new(),
        }
    }

    /// Create an empty directory
    #[must_use]
    pub fn with_new_directory(self, path: impl Into<PathBuf>) -> Self {
        self.push(ContainerOp::NewDirectory { path: path.into() })
    }

    /// Write a file
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.push(ContainerOp::File {
            path: path.into(),
            contents: contents.into(),
        })
    }

    /// Copy a host subtree over `path`
    #[must_use]
    pub fn with_directory(self, path: impl Into<PathBuf>, tree: HostTree) -> Self {
        self.push(ContainerOp::Directory {
            path: path.into(),
            tree,
        })
    }

    /// Run a command
    #[must_use]
    pub fn with_exec<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ContainerOp::Exec {
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    /// The base build
    pub fn base(&self) -> &DockerBuild {
        &self.base
    }

    /// Operations in application order
    pub fn ops(&self) -> &[ContainerOp] {
        &self.ops
    }

    fn push(mut self, op: ContainerOp) -> Self {
        self.ops.push(op);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(path: &str) -> HostTree {
        HostTree {
            path: PathBuf::from(path),
            ignore: IgnorePatterns::default(),
        }
    }

    #[test]
    fn test_directory_entries_are_sorted_and_replaced() {
        let dir = Directory::new()
            .with_file("uv.lock", "a")
            .with_file("Dockerfile", "FROM x")
            .with_file("uv.lock", "b");

        let paths: Vec<_> = dir.entries().map(|(p, _)| p.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("Dockerfile"), PathBuf::from("uv.lock")]);
        assert_eq!(
            dir.get("uv.lock"),
            Some(&ContextEntry::File {
                contents: "b".to_string()
            })
        );
        assert!(!dir.contains_tree());
    }

    #[test]
    fn test_directory_with_tree() {
        let dir = Directory::new().with_directory("libs/core", tree("/repo/libs/core"));
        assert!(dir.contains_tree());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_container_ops_keep_order() {
        let container = Container::docker_build(
            DockerBuild::new(Directory::new(), "Dockerfile", "deps-dev").with_build_arg("PROJECT", "api"),
        )
        .with_new_directory("libs/core")
        .with_file("libs/core/README.md", "")
        .with_exec(["uv", "sync"])
        .with_directory("libs/core", tree("/repo/libs/core"));

        assert_eq!(container.base().target, "deps-dev");
        assert_eq!(container.base().build_args["PROJECT"], "api");
        assert_eq!(container.ops().len(), 4);
        assert!(matches!(container.ops()[0], ContainerOp::NewDirectory { .. }));
        assert_eq!(
            container.ops()[2],
            ContainerOp::Exec {
                args: vec!["uv".to_string(), "sync".to_string()]
            }
        );
        assert!(matches!(container.ops()[3], ContainerOp::Directory { .. }));
    }

    #[test]
    fn test_container_serializes_ops() {
        let container = Container::docker_build(DockerBuild::new(Directory::new(), "Dockerfile", "deps"))
            .with_new_directory("a");
        let json = serde_json::to_value(&container).unwrap();
        assert_eq!(json["ops"][0]["op"], "new_directory");
        assert_eq!(json["ops"][0]["path"], "a");
        assert_eq!(json["base"]["target"], "deps");
    }
}
