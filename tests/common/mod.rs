//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test workspace context
///
/// Creates a temporary directory for a uv workspace and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test workspace
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new empty test workspace in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create the sample workspace described by [`SAMPLE_LOCK`]
    #[allow(dead_code)]
    pub fn sample() -> Self {
        let project = Self::new();
        project.create_file("uv.lock", SAMPLE_LOCK);
        project.create_file("pyproject.toml", SAMPLE_ROOT_MANIFEST);
        project.create_file("Dockerfile", SAMPLE_DOCKERFILE);
        project.create_file(
            "projects/api/pyproject.toml",
            "[project]\nname = \"api\"\nversion = \"0.1.0\"\n",
        );
        project.create_file("projects/api/src/api/__init__.py", "");
        project.create_file("projects/api/src/api/main.py", "print('api')\n");
        project.create_file(
            "libs/core/pyproject.toml",
            "[project]\nname = \"core-lib\"\nversion = \"0.1.0\"\n",
        );
        project.create_file("libs/core/src/core_lib/__init__.py", "VALUE = 1\n");
        project.create_file("libs/core/src/core_lib/__pycache__/x.cpython-312.pyc", "");
        project.create_file(
            "libs/utils/pyproject.toml",
            "[project]\nname = \"utils\"\nversion = \"0.1.0\"\n",
        );
        project.create_file("libs/utils/src/utils/__init__.py", "");
        project.create_file("projects/worker/pyproject.toml", "[project]\nname = \"worker\"\n");
        project
    }

    /// Get the path to the test workspace directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test workspace
    #[allow(dead_code)]
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Remove a file or directory from the test workspace
    #[allow(dead_code)]
    pub fn remove(&self, name: &str) {
        let path = self.dir.path().join(name);
        if path.is_dir() {
            std::fs::remove_dir_all(path).expect("Failed to remove directory");
        } else {
            std::fs::remove_file(path).expect("Failed to remove file");
        }
    }

    /// Check if a file exists in the test workspace
    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Run uvstage against this workspace
    #[allow(dead_code)]
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_uvstage"));
        cmd.arg("--repo").arg(self.path());
        cmd.env_remove("UVSTAGE_REPO");
        cmd.env_remove("RUST_LOG");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute uvstage")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample lock file: `api` depends on `core-lib` (member), `httpx`
/// (third-party) and a bare `legacy` name; `core-lib` depends on `utils`.
#[allow(dead_code)]
pub const SAMPLE_LOCK: &str = r#"
version = 1
revision = 2
requires-python = ">=3.12"

[manifest]
members = ["api", "core-lib", "utils", "worker"]

[[package]]
name = "api"
version = "0.1.0"
source = { editable = "projects/api" }
dependencies = [
    { name = "core-lib" },
    { name = "httpx" },
    "legacy",
]

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
name = "worker"
version = "0.1.0"
source = { virtual = "projects/worker" }

[[package]]
name = "httpx"
version = "0.27.0"
source = { registry = "https://pypi.org/simple" }
"#;

/// Sample workspace root manifest
#[allow(dead_code)]
pub const SAMPLE_ROOT_MANIFEST: &str = r#"
[project]
name = "monorepo"
version = "0.0.0"

[tool.uv.workspace]
members = ["projects/*", "libs/*"]
"#;

/// Sample multi-stage Dockerfile
#[allow(dead_code)]
pub const SAMPLE_DOCKERFILE: &str = r#"
FROM python:3.12-slim AS deps-dev
ARG PROJECT
WORKDIR /src
COPY pyproject.toml uv.lock ./
RUN uv sync --no-install-workspace --package ${PROJECT}
"#;
