//! Export command implementation
//!
//! Implements `uvstage export` to write the minimal source tree of a project:
//! the root manifest, the lock file and every local package it needs.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::cli::output::{status, OutputConfig};
use crate::config::settings::BuildOverrides;
use crate::core::stage;
use crate::infra::filesystem;

/// Execute the export command
pub async fn execute(
    repo_root: &Path,
    project: &str,
    out: &Path,
    overrides: &BuildOverrides,
    output: OutputConfig,
) -> Result<()> {
    let (settings, repo) = super::open_repository(repo_root)?;

    if out.exists() {
        let non_empty = std::fs::read_dir(out)
            .with_context(|| format!("Failed to read {}", out.display()))?
            .next()
            .is_some();
        if non_empty {
            bail!("Output directory '{}' is not empty", out.display());
        }
    }

    let lock = stage::load_lockfile(&repo).context("Failed to load uv.lock")?;
    let options = settings.resolve_options(overrides);
    let tree = stage::source_directory_for_project(&repo, &lock, project, &options)
        .with_context(|| format!("Failed to collect sources of '{project}'"))?;

    tracing::info!("Writing {} entries to {}", tree.len(), out.display());
    filesystem::write_directory(&tree, out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    if output.json {
        let paths: Vec<String> = tree
            .entries()
            .map(|(path, _)| path.display().to_string())
            .collect();
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else if !output.quiet {
        println!(
            "{} Exported '{project}' to {}",
            status::SUCCESS,
            out.display()
        );
    }
    Ok(())
}
