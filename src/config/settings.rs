//! Settings management
//!
//! Reads optional per-repository settings from `uvstage.toml` at the
//! repository root and merges them with command-line flags.
//!
//! Priority: CLI flags > settings file > built-in defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::resolver::{ClosureMode, ResolveOptions};
use crate::core::stage::StageOptions;
use crate::error::{RepoError, SettingsError};
use crate::infra::docker::ContainerRuntime;
use crate::infra::repo::IgnorePatterns;

/// Contents of `uvstage.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Build settings
    #[serde(default)]
    pub build: BuildSettings,

    /// Build context settings
    #[serde(default)]
    pub context: ContextSettings,
}

/// The `[build]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSettings {
    /// Dockerfile path relative to the repository root
    pub dockerfile: Option<PathBuf>,

    /// Dockerfile stage installing third-party dependencies
    pub target: Option<String>,

    /// Build argument receiving the project name
    pub project_arg: Option<String>,

    /// Install command, without the per-project flags
    pub install_command: Option<Vec<String>>,

    /// Package never installed from the workspace
    pub exclude_package: Option<String>,

    /// Follow local dependencies transitively
    pub recursive: Option<bool>,

    /// Follow dev-dependency groups of the project
    pub include_dev: Option<bool>,

    /// Container runtime
    pub runtime: Option<ContainerRuntime>,
}

/// The `[context]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextSettings {
    /// Extra files added to the dependency context when they exist
    pub extra_files: Option<Vec<PathBuf>>,

    /// Patterns excluded from copied source trees
    pub ignore: Option<Vec<String>>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    /// `--dockerfile`
    pub dockerfile: Option<PathBuf>,
    /// `--target`
    pub target: Option<String>,
    /// `--exclude-package`
    pub exclude_package: Option<String>,
    /// `--recursive`
    pub recursive: bool,
    /// `--include-dev`
    pub include_dev: bool,
    /// `--runtime`
    pub runtime: Option<ContainerRuntime>,
}

impl Settings {
    /// Load settings from a repository root
    ///
    /// A missing settings file yields the defaults.
    pub fn load(repo_root: &Path) -> Result<Self, SettingsError> {
        Self::load_from_path(&repo_root.join(defaults::SETTINGS_FILE))
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Compile the configured ignore patterns
    pub fn ignore_patterns(&self) -> Result<IgnorePatterns, RepoError> {
        match &self.context.ignore {
            Some(patterns) => IgnorePatterns::new(patterns),
            None => IgnorePatterns::new(defaults::DEFAULT_IGNORE_PATTERNS),
        }
    }

    /// Resolution options after applying CLI flags
    pub fn resolve_options(&self, overrides: &BuildOverrides) -> ResolveOptions {
        let recursive = overrides.recursive || self.build.recursive.unwrap_or(false);
        ResolveOptions {
            mode: if recursive {
                ClosureMode::Recursive
            } else {
                ClosureMode::Direct
            },
            include_dev: overrides.include_dev || self.build.include_dev.unwrap_or(false),
        }
    }

    /// Stage options after applying CLI flags
    pub fn stage_options(&self, overrides: &BuildOverrides) -> StageOptions {
        StageOptions {
            dockerfile: overrides
                .dockerfile
                .clone()
                .or_else(|| self.build.dockerfile.clone())
                .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_DOCKERFILE)),
            target: overrides
                .target
                .clone()
                .or_else(|| self.build.target.clone())
                .unwrap_or_else(|| defaults::DEFAULT_DEPS_TARGET.to_string()),
            project_arg: self
                .build
                .project_arg
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_PROJECT_ARG.to_string()),
            install_command: self.build.install_command.clone().unwrap_or_else(|| {
                defaults::DEFAULT_INSTALL_COMMAND
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }),
            exclude_package: overrides
                .exclude_package
                .clone()
                .or_else(|| self.build.exclude_package.clone()),
            extra_context_files: self.context.extra_files.clone().unwrap_or_else(|| {
                defaults::DEFAULT_EXTRA_CONTEXT_FILES
                    .iter()
                    .map(PathBuf::from)
                    .collect()
            }),
            resolve: self.resolve_options(overrides),
        }
    }

    /// Container runtime after applying CLI flags, if one was chosen
    pub fn runtime(&self, overrides: &BuildOverrides) -> Option<ContainerRuntime> {
        overrides.runtime.or(self.build.runtime)
    }
}
