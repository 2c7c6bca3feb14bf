//! Error types for uvstage
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Lockfile (uv.lock) errors
#[derive(Error, Debug)]
pub enum LockfileError {
    /// Lockfile content is not valid TOML or does not match the expected shape
    #[error("Failed to parse lockfile: {source}")]
    Parse { source: toml::de::Error },
}

/// Package manifest (pyproject.toml) errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest content is not valid TOML
    #[error("Failed to parse manifest '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Manifest has no `[project]` name
    #[error("Manifest '{path}' is missing required field 'project.name'")]
    MissingName { path: PathBuf },
}

/// Dependency resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Requested project has no record in the lockfile
    #[error("Project '{project}' not found in lockfile")]
    ProjectNotFound { project: String },

    /// A local package in the closure is not installed from an editable path
    #[error("Local package '{package}' has no editable source (found '{source_kind}')")]
    MissingLocalSource {
        package: String,
        source_kind: String,
    },
}

/// Repository accessor errors
#[derive(Error, Debug)]
pub enum RepoError {
    /// Path points outside the repository root
    #[error("Path '{path}' is outside the repository")]
    OutsideRepository { path: PathBuf },

    /// Failed to read a file from the repository
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Invalid ignore pattern
    #[error("Invalid ignore pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy a file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Staged build errors
#[derive(Error, Debug)]
pub enum StageError {
    /// A declared path does not exist in the repository checkout
    #[error("Path '{path}' does not exist in the repository")]
    MissingPath { path: PathBuf },

    /// Lockfile error
    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    /// Resolver error
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Repository error
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Container engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// No container runtime in PATH
    #[error("Neither Docker nor Podman found in PATH")]
    RuntimeNotFound,

    /// Engine command exited unsuccessfully
    #[error("{step} failed ({status}): {stderr}")]
    CommandFailed {
        step: String,
        status: String,
        stderr: String,
    },

    /// Engine command could not be spawned
    #[error("Failed to run '{command}': {error}")]
    Spawn { command: String, error: String },

    /// Staging the build context failed
    #[error("Failed to stage build context: {0}")]
    Staging(#[from] FilesystemError),
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read settings file
    #[error("Failed to read settings file '{path}': {error}")]
    Read { path: String, error: String },

    /// Failed to parse settings file
    #[error("Failed to parse settings file '{path}': {error}")]
    Parse { path: String, error: String },
}
