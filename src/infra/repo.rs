//! Repository accessor
//!
//! Read access to a repository checkout through repository-relative paths.
//! Ignore patterns are compiled once and handed to every subtree so that
//! copies made later exclude the same files.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::core::container::HostTree;
use crate::error::RepoError;

/// Compiled ignore patterns
///
/// Patterns use gitignore syntax and are matched against paths relative to
/// the copied directory. A pattern without `/` (`__pycache__`, `*.pyc`)
/// matches at any depth, one containing `/` (`docs/*.md`) is anchored to
/// that directory, and `!` re-includes a path excluded earlier.
#[derive(Clone)]
pub struct IgnorePatterns {
    patterns: Arc<Vec<String>>,
    matcher: Arc<Gitignore>,
}

impl IgnorePatterns {
    /// Compile a list of gitignore patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, RepoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        let mut sources = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|e| RepoError::InvalidPattern {
                    pattern: pattern.to_string(),
                    error: e.to_string(),
                })?;
            sources.push(pattern.to_string());
        }

        let matcher = builder.build().map_err(|e| RepoError::InvalidPattern {
            pattern: sources.join(", "),
            error: e.to_string(),
        })?;

        Ok(Self {
            patterns: Arc::new(sources),
            matcher: Arc::new(matcher),
        })
    }

    /// Check whether a relative path, or any of its parents, is ignored
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }

    /// Source patterns
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        Self {
            patterns: Arc::default(),
            matcher: Arc::new(Gitignore::empty()),
        }
    }
}

impl PartialEq for IgnorePatterns {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl fmt::Debug for IgnorePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

/// Read access to a source tree
pub trait SourceTree {
    /// Read a UTF-8 file
    fn read_file(&self, path: &Path) -> Result<String, RepoError>;

    /// Whether `path` is an existing file
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Reference to a subtree
    fn directory(&self, path: &Path) -> Result<HostTree, RepoError>;
}

/// A repository checkout on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalRepo {
    root: PathBuf,
    ignore: IgnorePatterns,
}

impl LocalRepo {
    /// Open a checkout rooted at `root`
    pub fn new(root: impl Into<PathBuf>, ignore: IgnorePatterns) -> Self {
        Self {
            root: root.into(),
            ignore,
        }
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ignore patterns applied to subtrees
    pub fn ignore(&self) -> &IgnorePatterns {
        &self.ignore
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, RepoError> {
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(RepoError::OutsideRepository {
                path: path.to_path_buf(),
            });
        }
        Ok(self.root.join(path))
    }
}

impl SourceTree for LocalRepo {
    fn read_file(&self, path: &Path) -> Result<String, RepoError> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(&full).map_err(|e| RepoError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_ok_and(|p| p.is_file())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_ok_and(|p| p.is_dir())
    }

    fn directory(&self, path: &Path) -> Result<HostTree, RepoError> {
        Ok(HostTree {
            path: self.resolve(path)?,
            ignore: self.ignore.clone(),
        })
    }
}
