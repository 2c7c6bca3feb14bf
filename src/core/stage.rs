//! Staged build orchestration
//!
//! Turns a resolved project into a [`Container`] built in three phases,
//! ordered from least to most frequently changing input:
//!
//! 1. third-party dependencies, from a context holding only the lock file,
//!    the root manifest and the Dockerfile;
//! 2. placeholder packages for every local dependency (manifest, empty
//!    marker file, empty `src/<module>/__init__.py`) followed by one install;
//! 3. the real source of every local dependency copied over the
//!    placeholders.
//!
//! Only phase 3 depends on source contents, so source edits leave the image
//! cache of phases 1 and 2 intact.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::container::{Container, Directory, DockerBuild};
use crate::core::lockfile::LockfileDocument;
use crate::core::pyproject::PackageManifest;
use crate::core::resolver::{self, ProjectSourceMap, ResolveOptions};
use crate::error::StageError;
use crate::infra::repo::SourceTree;

/// Options for a staged build
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    /// Dockerfile path relative to the repository root
    pub dockerfile: PathBuf,
    /// Dockerfile stage installing third-party dependencies
    pub target: String,
    /// Build argument receiving the project name
    pub project_arg: String,
    /// Install command, without the per-project flags
    pub install_command: Vec<String>,
    /// Package excluded from installation
    pub exclude_package: Option<String>,
    /// Extra files added to the dependency context when present
    pub extra_context_files: Vec<PathBuf>,
    /// Resolution options
    pub resolve: ResolveOptions,
}

/// Load and parse the repository lock file
pub fn load_lockfile(repo: &impl SourceTree) -> Result<LockfileDocument, StageError> {
    let path = Path::new(defaults::LOCKFILE);
    if !repo.is_file(path) {
        return Err(StageError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let content = repo.read_file(path)?;
    Ok(LockfileDocument::parse(&content)?)
}

/// Build `project`
///
/// The lock file is parsed once and shared by every phase.
pub fn build_project(
    repo: &impl SourceTree,
    project: &str,
    options: &StageOptions,
) -> Result<Container, StageError> {
    let lock = load_lockfile(repo)?;
    build_project_with_lock(repo, &lock, project, options)
}

/// Build `project` from an already parsed lock file
pub fn build_project_with_lock(
    repo: &impl SourceTree,
    lock: &LockfileDocument,
    project: &str,
    options: &StageOptions,
) -> Result<Container, StageError> {
    let sources = resolver::resolve(lock, project, &options.resolve)?;
    tracing::info!(
        "Project '{}' needs {} local package(s)",
        project,
        sources.len()
    );

    tracing::info!("Phase 1: dependency image (target '{}')", options.target);
    let context = dependency_context(repo, options)?;
    let base = DockerBuild::new(context, &options.dockerfile, &options.target)
        .with_build_arg(&options.project_arg, project);
    let container = Container::docker_build(base);

    tracing::info!("Phase 2: placeholder packages and install");
    let container = scaffold(container, repo, &sources)?;
    let container = container.with_exec(install_command(project, options));

    tracing::info!("Phase 3: source overlay");
    overlay_sources(container, repo, &sources)
}

/// Build context for the dependency phase
///
/// Holds the root manifest, the lock file, the Dockerfile and the extra
/// context files that exist. Never contains package sources.
pub fn dependency_context(
    repo: &impl SourceTree,
    options: &StageOptions,
) -> Result<Directory, StageError> {
    let mut context = Directory::new();

    let required = [
        PathBuf::from(defaults::PACKAGE_MANIFEST),
        PathBuf::from(defaults::LOCKFILE),
        options.dockerfile.clone(),
    ];
    for path in required {
        if !repo.is_file(&path) {
            return Err(StageError::MissingPath { path });
        }
        let contents = repo.read_file(&path)?;
        context = context.with_file(path, contents);
    }

    for path in &options.extra_context_files {
        if repo.is_file(path) {
            let contents = repo.read_file(path)?;
            context = context.with_file(path, contents);
        } else {
            tracing::debug!("Optional context file {} not present", path.display());
        }
    }

    Ok(context)
}

/// A local package prepared for scaffolding
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Source directory relative to the repository root
    pub location: PathBuf,
    /// Manifest contents
    pub manifest: String,
    /// Importable module name
    pub module: String,
}

impl Placeholder {
    /// Path of the empty marker file
    pub fn marker_path(&self) -> PathBuf {
        self.location.join(defaults::PLACEHOLDER_MARKER)
    }

    /// Path of the empty module init file
    pub fn init_path(&self) -> PathBuf {
        self.location
            .join("src")
            .join(&self.module)
            .join(defaults::PLACEHOLDER_INIT)
    }

    /// Path of the manifest copy
    pub fn manifest_path(&self) -> PathBuf {
        self.location.join(defaults::PACKAGE_MANIFEST)
    }
}

/// Read the manifest of a local package and derive its placeholder
pub fn placeholder(repo: &impl SourceTree, location: &Path) -> Result<Placeholder, StageError> {
    if !repo.is_dir(location) {
        return Err(StageError::MissingPath {
            path: location.to_path_buf(),
        });
    }

    let manifest_path = location.join(defaults::PACKAGE_MANIFEST);
    if !repo.is_file(&manifest_path) {
        return Err(StageError::MissingPath {
            path: manifest_path,
        });
    }

    let manifest = repo.read_file(&manifest_path)?;
    let module = PackageManifest::parse(&manifest, &manifest_path)?.module_name();

    Ok(Placeholder {
        location: location.to_path_buf(),
        manifest,
        module,
    })
}

/// Create placeholder packages for every local dependency
pub fn scaffold(
    container: Container,
    repo: &impl SourceTree,
    sources: &ProjectSourceMap,
) -> Result<Container, StageError> {
    // Every package touches its own paths, so manifests are read up front
    // and the container is threaded afterwards.
    let placeholders = sources
        .iter()
        .map(|(_, location)| placeholder(repo, location))
        .collect::<Result<Vec<_>, _>>()?;

    let mut container = container;
    for p in placeholders {
        tracing::debug!("Scaffolding {} as module '{}'", p.location.display(), p.module);
        container = container
            .with_new_directory(&p.location)
            .with_file(p.manifest_path(), p.manifest.as_str())
            .with_file(p.marker_path(), "")
            .with_file(p.init_path(), "");
    }

    Ok(container)
}

/// Install command for `project`
///
/// The install runs in inexact mode so the placeholder contents are
/// tolerated.
pub fn install_command(project: &str, options: &StageOptions) -> Vec<String> {
    let mut args = options.install_command.clone();
    args.push("--inexact".to_string());
    args.push("--package".to_string());
    args.push(project.to_string());
    if let Some(excluded) = &options.exclude_package {
        args.push("--no-install-package".to_string());
        args.push(excluded.clone());
    }
    args
}

/// Copy the real source of every local dependency over its placeholder
pub fn overlay_sources(
    container: Container,
    repo: &impl SourceTree,
    sources: &ProjectSourceMap,
) -> Result<Container, StageError> {
    let mut container = container;
    for (name, location) in sources.iter() {
        if !repo.is_dir(location) {
            return Err(StageError::MissingPath {
                path: location.clone(),
            });
        }
        tracing::debug!("Overlaying source of '{}' at {}", name, location.display());
        container = container.with_directory(location, repo.directory(location)?);
    }
    Ok(container)
}

/// Minimal source tree for `project`
///
/// Contains the root manifest, the lock file and the source directory of
/// every local package the project needs.
pub fn source_directory_for_project(
    repo: &impl SourceTree,
    lock: &LockfileDocument,
    project: &str,
    options: &ResolveOptions,
) -> Result<Directory, StageError> {
    let sources = resolver::resolve(lock, project, options)?;

    let mut dir = Directory::new();
    for path in [defaults::PACKAGE_MANIFEST, defaults::LOCKFILE] {
        let path = Path::new(path);
        if repo.is_file(path) {
            dir = dir.with_file(path, repo.read_file(path)?);
        }
    }

    for (_, location) in sources.iter() {
        if !repo.is_dir(location) {
            return Err(StageError::MissingPath {
                path: location.clone(),
            });
        }
        dir = dir.with_directory(location, repo.directory(location)?);
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::container::{ContainerOp, ContextEntry};
    use crate::core::resolver::ClosureMode;
    use crate::error::ResolverError;
    use crate::infra::repo::{IgnorePatterns, LocalRepo};
    use tempfile::TempDir;

    const LOCK: &str = r#"
version = 1

[manifest]
members = ["api", "core-lib", "utils"]

[[package]]
name = "api"
version = "0.1.0"
source = { editable = "projects/api" }
dependencies = [{ name = "core-lib" }, { name = "httpx" }]

[[package]]
name = "core-lib"
version = "0.1.0"
source = { editable = "libs/core" }
dependencies = [{ name = "utils" }]

[[package]]
name = "utils"
version = "0.1.0"
source = { editable = "libs/utils" }

[[package]]
name = "httpx"
version = "0.27.0"
source = { registry = "https://pypi.org/simple" }
"#;

    fn write(root: &Path, path: &str, contents: &str) {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "uv.lock", LOCK);
        write(root, "pyproject.toml", "[tool.uv.workspace]\nmembers = [\"projects/*\", \"libs/*\"]\n");
        write(root, "Dockerfile", "FROM python:3.12 AS deps-dev\n");
        write(root, "projects/api/pyproject.toml", "[project]\nname = \"api\"\n");
        write(root, "projects/api/src/api/main.py", "print('hi')\n");
        write(root, "libs/core/pyproject.toml", "[project]\nname = \"Core-Lib\"\n");
        write(root, "libs/core/src/core_lib/__init__.py", "VALUE = 1\n");
        write(root, "libs/utils/pyproject.toml", "[project]\nname = \"utils\"\n");
        dir
    }

    fn options() -> StageOptions {
        StageOptions {
            dockerfile: PathBuf::from("Dockerfile"),
            target: "deps-dev".to_string(),
            project_arg: "PROJECT".to_string(),
            install_command: vec!["uv".to_string(), "sync".to_string()],
            exclude_package: None,
            extra_context_files: vec![PathBuf::from(".python-version")],
            resolve: ResolveOptions::default(),
        }
    }

    fn repo(dir: &TempDir) -> LocalRepo {
        LocalRepo::new(dir.path(), IgnorePatterns::default())
    }

    fn file_paths(container: &Container) -> Vec<PathBuf> {
        container
            .ops()
            .iter()
            .filter_map(|op| match op {
                ContainerOp::File { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_dependency_context_has_only_manifests() {
        let dir = workspace();
        write(dir.path(), ".python-version", "3.12\n");
        let context = dependency_context(&repo(&dir), &options()).unwrap();

        assert!(!context.contains_tree());
        let names: Vec<_> = context.entries().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from(".python-version"),
                PathBuf::from("Dockerfile"),
                PathBuf::from("pyproject.toml"),
                PathBuf::from("uv.lock"),
            ]
        );
    }

    #[test]
    fn test_dependency_context_skips_absent_extra_files() {
        let dir = workspace();
        let context = dependency_context(&repo(&dir), &options()).unwrap();
        assert_eq!(context.len(), 3);
        assert!(context.get(".python-version").is_none());
    }

    #[test]
    fn test_dependency_context_requires_dockerfile() {
        let dir = workspace();
        std::fs::remove_file(dir.path().join("Dockerfile")).unwrap();
        let err = dependency_context(&repo(&dir), &options()).unwrap_err();
        assert!(matches!(err, StageError::MissingPath { ref path } if path == Path::new("Dockerfile")));
    }

    #[test]
    fn test_build_project_phases() {
        let dir = workspace();
        let container = build_project(&repo(&dir), "api", &options()).unwrap();

        let base = container.base();
        assert_eq!(base.target, "deps-dev");
        assert_eq!(base.build_args["PROJECT"], "api");
        assert!(!base.context.contains_tree());

        let ops = container.ops();
        // Two packages, four ops each, then install, then two overlays
        assert_eq!(ops.len(), 2 * 4 + 1 + 2);

        let exec_at = ops
            .iter()
            .position(|op| matches!(op, ContainerOp::Exec { .. }))
            .unwrap();
        assert_eq!(exec_at, 8);
        assert!(ops[..exec_at]
            .iter()
            .all(|op| !matches!(op, ContainerOp::Directory { .. })));
        assert!(ops[exec_at + 1..]
            .iter()
            .all(|op| matches!(op, ContainerOp::Directory { .. })));
    }

    #[test]
    fn test_scaffold_creates_exact_placeholder_files() {
        let dir = workspace();
        let container = build_project(&repo(&dir), "api", &options()).unwrap();

        assert_eq!(
            file_paths(&container),
            vec![
                PathBuf::from("projects/api/pyproject.toml"),
                PathBuf::from("projects/api/README.md"),
                PathBuf::from("projects/api/src/api/__init__.py"),
                PathBuf::from("libs/core/pyproject.toml"),
                PathBuf::from("libs/core/README.md"),
                PathBuf::from("libs/core/src/core_lib/__init__.py"),
            ]
        );

        for op in container.ops() {
            if let ContainerOp::File { path, contents } = op {
                if path.ends_with("README.md") || path.ends_with("__init__.py") {
                    assert!(contents.is_empty(), "{} should be empty", path.display());
                } else {
                    assert!(contents.contains("[project]"));
                }
            }
        }
    }

    #[test]
    fn test_install_command() {
        let mut opts = options();
        assert_eq!(
            install_command("api", &opts),
            vec!["uv", "sync", "--inexact", "--package", "api"]
        );

        opts.exclude_package = Some("torch-wrapper".to_string());
        assert_eq!(
            install_command("api", &opts),
            vec![
                "uv",
                "sync",
                "--inexact",
                "--package",
                "api",
                "--no-install-package",
                "torch-wrapper"
            ]
        );
    }

    #[test]
    fn test_overlay_targets_source_locations() {
        let dir = workspace();
        let container = build_project(&repo(&dir), "api", &options()).unwrap();

        let overlays: Vec<_> = container
            .ops()
            .iter()
            .filter_map(|op| match op {
                ContainerOp::Directory { path, tree } => Some((path.clone(), tree.path.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            overlays,
            vec![
                (PathBuf::from("projects/api"), dir.path().join("projects/api")),
                (PathBuf::from("libs/core"), dir.path().join("libs/core")),
            ]
        );
    }

    #[test]
    fn test_recursive_closure_scaffolds_transitive_packages() {
        let dir = workspace();
        let mut opts = options();
        opts.resolve.mode = ClosureMode::Recursive;
        let container = build_project(&repo(&dir), "api", &opts).unwrap();
        assert!(file_paths(&container).contains(&PathBuf::from("libs/utils/src/utils/__init__.py")));
    }

    #[test]
    fn test_missing_source_directory() {
        let dir = workspace();
        std::fs::remove_dir_all(dir.path().join("libs/core")).unwrap();
        let err = build_project(&repo(&dir), "api", &options()).unwrap_err();
        assert!(matches!(err, StageError::MissingPath { ref path } if path == Path::new("libs/core")));
    }

    #[test]
    fn test_missing_package_manifest() {
        let dir = workspace();
        std::fs::remove_file(dir.path().join("libs/core/pyproject.toml")).unwrap();
        let err = build_project(&repo(&dir), "api", &options()).unwrap_err();
        assert!(matches!(
            err,
            StageError::MissingPath { ref path } if path == Path::new("libs/core/pyproject.toml")
        ));
    }

    #[test]
    fn test_unknown_project() {
        let dir = workspace();
        let err = build_project(&repo(&dir), "nonexistent", &options()).unwrap_err();
        assert!(matches!(
            err,
            StageError::Resolver(ResolverError::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_lockfile() {
        let dir = workspace();
        std::fs::remove_file(dir.path().join("uv.lock")).unwrap();
        let err = build_project(&repo(&dir), "api", &options()).unwrap_err();
        assert!(matches!(err, StageError::MissingPath { ref path } if path == Path::new("uv.lock")));
    }

    #[test]
    fn test_invalid_lockfile() {
        let dir = workspace();
        write(dir.path(), "uv.lock", "[[package]\n");
        let err = build_project(&repo(&dir), "api", &options()).unwrap_err();
        assert!(matches!(err, StageError::Lockfile(_)));
    }

    #[test]
    fn test_source_directory_for_project() {
        let dir = workspace();
        let repo = repo(&dir);
        let lock = load_lockfile(&repo).unwrap();
        let tree = source_directory_for_project(&repo, &lock, "api", &ResolveOptions::default()).unwrap();

        let paths: Vec<_> = tree.entries().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("libs/core"),
                PathBuf::from("projects/api"),
                PathBuf::from("pyproject.toml"),
                PathBuf::from("uv.lock"),
            ]
        );
        assert!(matches!(tree.get("uv.lock"), Some(ContextEntry::File { .. })));
        assert!(matches!(tree.get("libs/core"), Some(ContextEntry::Tree { .. })));
    }
}
