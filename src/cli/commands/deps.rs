//! Deps command implementation
//!
//! Implements `uvstage deps` to list the local packages a project needs.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::OutputConfig;
use crate::config::settings::BuildOverrides;
use crate::core::resolver;
use crate::core::stage;

/// Execute the deps command
pub async fn execute(
    repo_root: &Path,
    project: &str,
    overrides: &BuildOverrides,
    output: OutputConfig,
) -> Result<()> {
    let (settings, repo) = super::open_repository(repo_root)?;
    let lock = stage::load_lockfile(&repo).context("Failed to load uv.lock")?;

    let options = settings.resolve_options(overrides);
    let sources = resolver::resolve(&lock, project, &options)
        .with_context(|| format!("Failed to resolve local dependencies of '{project}'"))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if output.quiet {
        return Ok(());
    }

    let width = sources.names().map(String::len).max().unwrap_or(0);
    for (name, path) in sources.iter() {
        println!("{name:width$}  {}", path.display());
    }
    Ok(())
}
