//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod deps;
pub mod export;
pub mod plan;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::cli::output::OutputConfig;
use crate::config::settings::{BuildOverrides, Settings};
use crate::infra::docker::ContainerRuntime;
use crate::infra::repo::LocalRepo;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the local packages a project depends on
    Deps {
        /// Project name as it appears in uv.lock
        project: String,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Show the staged build without running it
    Plan {
        /// Project name as it appears in uv.lock
        project: String,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build a container image for a project
    Build {
        /// Project name as it appears in uv.lock
        project: String,

        /// Tag for the resulting image
        #[arg(short, long)]
        tag: Option<String>,

        /// Container runtime to use (detected when omitted)
        #[arg(long, value_enum)]
        runtime: Option<ContainerRuntime>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Write the minimal source tree of a project
    Export {
        /// Project name as it appears in uv.lock
        project: String,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

/// Dependency resolution flags
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Follow local dependencies of local dependencies
    #[arg(long)]
    pub recursive: bool,

    /// Also follow the project's dev-dependency groups
    #[arg(long)]
    pub include_dev: bool,
}

/// Staged build flags
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Dockerfile path relative to the repository root
    #[arg(long)]
    pub dockerfile: Option<PathBuf>,

    /// Dockerfile stage installing third-party dependencies
    #[arg(long)]
    pub target: Option<String>,

    /// Local package to leave out of the install step
    #[arg(long)]
    pub exclude_package: Option<String>,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

impl ResolveArgs {
    fn overrides(&self) -> BuildOverrides {
        BuildOverrides {
            recursive: self.recursive,
            include_dev: self.include_dev,
            ..Default::default()
        }
    }
}

impl BuildArgs {
    fn overrides(&self, runtime: Option<ContainerRuntime>) -> BuildOverrides {
        BuildOverrides {
            dockerfile: self.dockerfile.clone(),
            target: self.target.clone(),
            exclude_package: self.exclude_package.clone(),
            runtime,
            ..self.resolve.overrides()
        }
    }
}

/// Load settings and open the repository with the configured ignore patterns
pub(crate) fn open_repository(repo_root: &Path) -> Result<(Settings, LocalRepo)> {
    if !repo_root.is_dir() {
        anyhow::bail!("Repository root '{}' is not a directory", repo_root.display());
    }

    let settings = Settings::load(repo_root).context("Failed to load uvstage.toml")?;
    let ignore = settings
        .ignore_patterns()
        .context("Invalid ignore patterns in uvstage.toml")?;
    Ok((settings, LocalRepo::new(repo_root, ignore)))
}

impl Commands {
    /// Execute the command
    pub async fn run(self, repo_root: &Path, output: OutputConfig) -> Result<()> {
        match self {
            Self::Deps { project, resolve } => {
                deps::execute(repo_root, &project, &resolve.overrides(), output).await
            }
            Self::Plan { project, build } => {
                plan::execute(repo_root, &project, &build.overrides(None), output).await
            }
            Self::Build {
                project,
                tag,
                runtime,
                build: build_args,
            } => {
                let options = build::BuildOptions {
                    overrides: build_args.overrides(runtime),
                    tag,
                };
                build::execute(repo_root, &project, options, output).await
            }
            Self::Export {
                project,
                out,
                resolve,
            } => export::execute(repo_root, &project, &out, &resolve.overrides(), output).await,
        }
    }
}
