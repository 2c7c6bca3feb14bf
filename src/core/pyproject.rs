//! Package manifest (`pyproject.toml`) handling

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::ManifestError;

/// Parsed `pyproject.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PackageManifest {
    /// The `[project]` table
    pub project: ProjectTable,
}

/// The `[project]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectTable {
    /// Distribution name
    pub name: String,

    /// Version, absent for dynamic versions
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Deserialize)]
struct RawManifest {
    project: Option<RawProject>,
}

#[derive(Deserialize)]
struct RawProject {
    name: Option<String>,
    version: Option<String>,
}

impl PackageManifest {
    /// Parse from TOML string
    ///
    /// `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let project = raw.project.ok_or_else(|| ManifestError::MissingName {
            path: path.to_path_buf(),
        })?;
        let name = project.name.ok_or_else(|| ManifestError::MissingName {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            project: ProjectTable {
                name,
                version: project.version,
            },
        })
    }

    /// Importable module name derived from the project name
    pub fn module_name(&self) -> String {
        module_name(&self.project.name)
    }
}

/// Normalize a distribution name into the module directory name build
/// backends look for under `src/`.
///
/// Lower-cases and collapses runs of `-`, `_` and `.` into a single `_`.
pub fn module_name(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").expect("static regex"));
    re.replace_all(&name.to_lowercase(), "_").into_owned()
}
