//! Lock file handling
//!
//! Read-only view of a uv workspace lock file (`uv.lock`). Only the parts
//! needed to find local workspace packages are modelled; everything else in
//! the document is ignored.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::LockfileError;

/// Parsed lock file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LockfileDocument {
    /// Lock file format version
    #[serde(default)]
    pub version: Option<u32>,

    /// Lock file format revision
    #[serde(default)]
    pub revision: Option<u32>,

    /// Workspace manifest section
    #[serde(default)]
    pub manifest: LockManifest,

    /// Locked packages
    #[serde(default, rename = "package")]
    pub packages: Vec<LockedPackage>,
}

/// The `[manifest]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LockManifest {
    /// Names of local workspace members
    #[serde(default)]
    pub members: BTreeSet<String>,
}

/// A `[[package]]` entry
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LockedPackage {
    /// Package name, unique within the document
    pub name: String,

    /// Locked version
    #[serde(default)]
    pub version: Option<String>,

    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,

    /// Development dependencies, keyed by dependency group
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, Vec<DependencyRef>>,

    /// Where the package is installed from
    #[serde(default)]
    pub source: PackageSource,
}

/// A dependency reference inside a package entry
///
/// uv writes structured tables (`{ name = "x", marker = "..." }`); older or
/// hand-written lock files may carry bare names.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyRef {
    /// A bare package name
    Plain(String),
    /// A structured reference
    Structured(StructuredRef),
}

/// Structured dependency reference
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StructuredRef {
    /// Referenced package name
    pub name: String,

    /// Requested extras
    #[serde(default)]
    pub extra: Vec<String>,

    /// Environment marker
    #[serde(default)]
    pub marker: Option<String>,
}

impl DependencyRef {
    /// Name of the referenced package when it is a structured reference
    pub fn structured_name(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Structured(r) => Some(&r.name),
        }
    }
}

/// Package source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSource")]
pub enum PackageSource {
    /// Installed in editable mode from a path relative to the workspace root
    Editable(PathBuf),
    /// Any other source (registry, git, virtual, ...)
    Other { kind: String },
}

impl Default for PackageSource {
    fn default() -> Self {
        Self::Other {
            kind: "none".to_string(),
        }
    }
}

impl PackageSource {
    /// Short name of the source kind
    pub fn kind(&self) -> &str {
        match self {
            Self::Editable(_) => "editable",
            Self::Other { kind } => kind,
        }
    }

    /// Editable path, if any
    pub fn editable_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Editable(path) => Some(path),
            Self::Other { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawSource {
    editable: Option<PathBuf>,
    #[serde(flatten)]
    rest: BTreeMap<String, toml::Value>,
}

/// Keys naming the kind of a uv source, in lookup order
const SOURCE_KINDS: [&str; 6] = ["registry", "git", "url", "path", "directory", "virtual"];

impl From<RawSource> for PackageSource {
    fn from(raw: RawSource) -> Self {
        if let Some(path) = raw.editable {
            return Self::Editable(path);
        }

        let known = SOURCE_KINDS
            .iter()
            .find(|kind| raw.rest.contains_key(**kind))
            .map(ToString::to_string);
        let kind = known
            .or_else(|| raw.rest.into_keys().next())
            .unwrap_or_else(|| "none".to_string());
        Self::Other { kind }
    }
}

impl LockfileDocument {
    /// Parse from TOML string
    pub fn parse(content: &str) -> Result<Self, LockfileError> {
        toml::from_str(content).map_err(|source| LockfileError::Parse { source })
    }

    /// Workspace member names
    pub fn members(&self) -> &BTreeSet<String> {
        &self.manifest.members
    }

    /// Check whether a package is a workspace member
    pub fn is_member(&self, name: &str) -> bool {
        self.manifest.members.contains(name)
    }

    /// Look up a package entry by name
    pub fn package(&self, name: &str) -> Option<&LockedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }
}
