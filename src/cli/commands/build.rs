//! Build command implementation
//!
//! Implements `uvstage build` to plan the staged build of a project and
//! realize it with Docker or Podman.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{status, OutputConfig};
use crate::config::settings::BuildOverrides;
use crate::core::stage;
use crate::infra::dirs::UvstageDirs;
use crate::infra::docker::{BuildEngine, DockerEngine};

/// Build options
pub struct BuildOptions {
    /// Values given on the command line
    pub overrides: BuildOverrides,
    /// Tag for the resulting image
    pub tag: Option<String>,
}

/// Execute the build command
pub async fn execute(
    repo_root: &Path,
    project: &str,
    options: BuildOptions,
    output: OutputConfig,
) -> Result<()> {
    let (settings, repo) = super::open_repository(repo_root)?;
    let stage_options = settings.stage_options(&options.overrides);

    tracing::info!("Building project: {project}");
    let container = stage::build_project(&repo, project, &stage_options)
        .with_context(|| format!("Failed to plan build of '{project}'"))?;

    let engine = DockerEngine::detect(settings.runtime(&options.overrides), UvstageDirs::new())?;
    tracing::info!("Using {} runtime", engine.runtime().command());

    let spinner = output.spinner(&format!("Building {project}..."));
    let result = engine.realize(&container, options.tag.as_deref()).await;
    spinner.finish_and_clear();
    let image = result.with_context(|| format!("Container build of '{project}' failed"))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&image)?);
    } else if !output.quiet {
        match &image.tag {
            Some(tag) => println!("{} Built {tag} ({})", status::SUCCESS, image.id),
            None => println!("{} Built {}", status::SUCCESS, image.id),
        }
    }
    Ok(())
}
