//! Plan command implementation
//!
//! Implements `uvstage plan` to show the staged build of a project without
//! running a container runtime.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::OutputConfig;
use crate::config::settings::BuildOverrides;
use crate::core::container::{Container, ContainerOp, ContextEntry};
use crate::core::stage;

/// Execute the plan command
pub async fn execute(
    repo_root: &Path,
    project: &str,
    overrides: &BuildOverrides,
    output: OutputConfig,
) -> Result<()> {
    let (settings, repo) = super::open_repository(repo_root)?;
    let options = settings.stage_options(overrides);

    let container = stage::build_project(&repo, project, &options)
        .with_context(|| format!("Failed to plan build of '{project}'"))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&container)?);
    } else if !output.quiet {
        print!("{}", describe(&container));
    }
    Ok(())
}

/// Human-readable description of a container build
pub fn describe(container: &Container) -> String {
    let base = container.base();
    let mut out = String::new();

    out.push_str(&format!(
        "Build stage '{}' from {}\n",
        base.target,
        base.dockerfile.display()
    ));
    for (key, value) in &base.build_args {
        out.push_str(&format!("  arg {key}={value}\n"));
    }
    for (path, entry) in base.context.entries() {
        let kind = match entry {
            ContextEntry::File { .. } => "file",
            ContextEntry::Tree { .. } => "tree",
        };
        out.push_str(&format!("  context {kind} {}\n", path.display()));
    }

    out.push_str("Steps\n");
    for op in container.ops() {
        out.push_str("  ");
        out.push_str(&describe_op(op));
        out.push('\n');
    }
    out
}

fn describe_op(op: &ContainerOp) -> String {
    match op {
        ContainerOp::NewDirectory { path } => format!("mkdir {}", path.display()),
        ContainerOp::File { path, contents } => {
            format!("write {} ({} bytes)", path.display(), contents.len())
        }
        ContainerOp::Directory { path, tree } => {
            format!("copy {} -> {}", tree.path.display(), path.display())
        }
        ContainerOp::Exec { args } => format!("exec {}", args.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::container::{Directory, DockerBuild, HostTree};
    use crate::infra::repo::IgnorePatterns;
    use std::path::PathBuf;

    #[test]
    fn test_describe_lists_every_step() {
        let container = Container::docker_build(
            DockerBuild::new(
                Directory::new().with_file("uv.lock", ""),
                "Dockerfile",
                "deps-dev",
            )
            .with_build_arg("PROJECT", "api"),
        )
        .with_new_directory("libs/core")
        .with_file("libs/core/README.md", "")
        .with_exec(["uv", "sync"])
        .with_directory(
            "libs/core",
            HostTree {
                path: PathBuf::from("/repo/libs/core"),
                ignore: IgnorePatterns::default(),
            },
        );

        let text = describe(&container);
        assert_eq!(
            text,
            "Build stage 'deps-dev' from Dockerfile\n\
             \x20 arg PROJECT=api\n\
             \x20 context file uv.lock\n\
             Steps\n\
             \x20 mkdir libs/core\n\
             \x20 write libs/core/README.md (0 bytes)\n\
             \x20 exec uv sync\n\
             \x20 copy /repo/libs/core -> libs/core\n"
        );
    }
}
