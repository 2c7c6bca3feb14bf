//! Container engine
//!
//! Realizes a [`Container`] description with Docker or Podman:
//!
//! 1. the base [`DockerBuild`] context is written to a staging directory and
//!    built up to its target stage;
//! 2. the container operations are rendered as a second Dockerfile starting
//!    `FROM` the first image, with file contents stored under names derived
//!    from their SHA-256 so unchanged inputs keep the runtime's layer cache.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::core::container::{Container, ContainerOp, DockerBuild, HostTree};
use crate::error::EngineError;
use crate::infra::dirs::UvstageDirs;
use crate::infra::filesystem;

/// Container runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    /// Docker container runtime
    Docker,
    /// Podman container runtime
    Podman,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Detect an available runtime, preferring Docker
    pub fn detect() -> Option<ContainerRuntime> {
        [ContainerRuntime::Docker, ContainerRuntime::Podman]
            .into_iter()
            .find(|runtime| which::which(runtime.command()).is_ok())
    }
}

/// Result of realizing a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltImage {
    /// Image id reported by the runtime
    pub id: String,
    /// Tag applied to the image
    pub tag: Option<String>,
}

/// Something that can turn a [`Container`] description into an image
#[allow(async_fn_in_trait)]
pub trait BuildEngine {
    /// Build the image, optionally tagging it
    async fn realize(&self, container: &Container, tag: Option<&str>) -> Result<BuiltImage, EngineError>;
}

/// Content staged next to the overlay Dockerfile
#[derive(Debug, Clone, PartialEq)]
pub enum Blob {
    /// File contents
    File(String),
    /// Host subtree
    Tree(HostTree),
}

/// Overlay Dockerfile plus the blobs it copies from
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayContext {
    /// Dockerfile text
    pub dockerfile: String,
    /// Context-relative blob path -> content
    pub blobs: Vec<(PathBuf, Blob)>,
}

impl OverlayContext {
    /// Render the operations of `container` on top of `base_image`
    pub fn render(container: &Container, base_image: &str) -> Self {
        let mut lines = vec![format!("FROM {base_image}")];
        let mut blobs: Vec<(PathBuf, Blob)> = Vec::new();
        let mut trees = 0usize;

        for op in container.ops() {
            match op {
                ContainerOp::NewDirectory { path } => {
                    lines.push(format!(
                        "RUN {}",
                        json_array(&["mkdir".to_string(), "-p".to_string(), path_str(path)])
                    ));
                }
                ContainerOp::File { path, contents } => {
                    let blob = PathBuf::from("files").join(content_digest(contents));
                    if !blobs.iter().any(|(p, _)| *p == blob) {
                        blobs.push((blob.clone(), Blob::File(contents.clone())));
                    }
                    lines.push(format!(
                        "COPY {}",
                        json_array(&[path_str(&blob), path_str(path)])
                    ));
                }
                ContainerOp::Directory { path, tree } => {
                    let blob = PathBuf::from("trees").join(trees.to_string());
                    trees += 1;
                    blobs.push((blob.clone(), Blob::Tree(tree.clone())));
                    lines.push(format!(
                        "COPY {}",
                        json_array(&[dir_str(&blob), dir_str(path)])
                    ));
                }
                ContainerOp::Exec { args } => {
                    lines.push(format!("RUN {}", json_array(args)));
                }
            }
        }

        let mut dockerfile = lines.join("\n");
        dockerfile.push('\n');
        Self { dockerfile, blobs }
    }

    /// Write the Dockerfile and blobs below `dir`
    pub fn stage(&self, dir: &Path) -> Result<(), EngineError> {
        filesystem::write_file(&dir.join(OVERLAY_DOCKERFILE), &self.dockerfile)?;
        for (path, blob) in &self.blobs {
            let target = dir.join(path);
            match blob {
                Blob::File(contents) => filesystem::write_file(&target, contents)?,
                Blob::Tree(tree) => {
                    filesystem::copy_tree(tree, &target)?;
                }
            }
        }
        Ok(())
    }
}

const OVERLAY_DOCKERFILE: &str = "Dockerfile.overlay";

fn content_digest(contents: &str) -> String {
    hex::encode(Sha256::digest(contents.as_bytes()))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn dir_str(path: &Path) -> String {
    let mut s = path_str(path);
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

fn json_array(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Arguments for building the dependency stage
pub fn base_build_args(build: &DockerBuild, context_dir: &Path, iidfile: &Path) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--file".to_string(),
        context_dir.join(&build.dockerfile).display().to_string(),
        "--target".to_string(),
        build.target.clone(),
    ];
    for (key, value) in &build.build_args {
        args.push("--build-arg".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push("--iidfile".to_string());
    args.push(iidfile.display().to_string());
    args.push(context_dir.display().to_string());
    args
}

/// Arguments for building the overlay image
pub fn overlay_build_args(context_dir: &Path, tag: Option<&str>, iidfile: &Path) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--file".to_string(),
        context_dir.join(OVERLAY_DOCKERFILE).display().to_string(),
    ];
    if let Some(tag) = tag {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }
    args.push("--iidfile".to_string());
    args.push(iidfile.display().to_string());
    args.push(context_dir.display().to_string());
    args
}

/// Docker or Podman backed engine
#[derive(Debug, Clone)]
pub struct DockerEngine {
    runtime: ContainerRuntime,
    program: PathBuf,
    dirs: UvstageDirs,
}

impl DockerEngine {
    /// Create an engine for a known runtime
    pub fn new(runtime: ContainerRuntime, dirs: UvstageDirs) -> Self {
        Self {
            runtime,
            program: PathBuf::from(runtime.command()),
            dirs,
        }
    }

    /// Run the runtime from an explicit executable instead of `PATH`
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Create an engine for the requested runtime, or detect one
    pub fn detect(requested: Option<ContainerRuntime>, dirs: UvstageDirs) -> Result<Self, EngineError> {
        let runtime = match requested {
            Some(runtime) => runtime,
            None => ContainerRuntime::detect().ok_or(EngineError::RuntimeNotFound)?,
        };
        Ok(Self::new(runtime, dirs))
    }

    /// Runtime in use
    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    async fn run(&self, step: &str, args: &[String]) -> Result<(), EngineError> {
        let command = self.program.display().to_string();
        tracing::debug!("Running {} {}", command, args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                command: command.clone(),
                error: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EngineError::CommandFailed {
                step: step.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!("{}", String::from_utf8_lossy(&output.stderr));
        Ok(())
    }

    async fn realize_in(
        &self,
        staging: &Path,
        container: &Container,
        tag: Option<&str>,
    ) -> Result<BuiltImage, EngineError> {
        let base = container.base();
        let base_dir = staging.join("base");
        filesystem::write_directory(&base.context, &base_dir)?;

        let base_iid = staging.join("base.iid");
        tracing::info!("Building dependency stage '{}'", base.target);
        self.run(
            "dependency image build",
            &base_build_args(base, &base_dir, &base_iid),
        )
        .await?;
        let base_image = filesystem::read_file(&base_iid)?.trim().to_string();

        let overlay = OverlayContext::render(container, &base_image);
        let overlay_dir = staging.join("overlay");
        overlay.stage(&overlay_dir)?;

        let overlay_iid = staging.join("overlay.iid");
        tracing::info!("Building overlay on {}", base_image);
        self.run(
            "overlay image build",
            &overlay_build_args(&overlay_dir, tag, &overlay_iid),
        )
        .await?;
        let id = filesystem::read_file(&overlay_iid)?.trim().to_string();

        Ok(BuiltImage {
            id,
            tag: tag.map(ToString::to_string),
        })
    }
}

impl BuildEngine for DockerEngine {
    async fn realize(&self, container: &Container, tag: Option<&str>) -> Result<BuiltImage, EngineError> {
        let label: String = tag
            .unwrap_or("image")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let staging = self.dirs.staging_dir(&label);
        filesystem::remove_dir_all(&staging)?;

        let result = self.realize_in(&staging, container, tag).await;
        let cleanup = filesystem::remove_dir_all(&staging);
        let image = result?;
        cleanup?;
        Ok(image)
    }
}
