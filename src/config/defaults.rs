//! Default configuration values

/// Lock file name at the repository root
pub const LOCKFILE: &str = "uv.lock";

/// Package manifest file name
pub const PACKAGE_MANIFEST: &str = "pyproject.toml";

/// Settings file name at the repository root
pub const SETTINGS_FILE: &str = "uvstage.toml";

/// Default Dockerfile path, relative to the repository root
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Default Dockerfile stage that installs third-party dependencies
pub const DEFAULT_DEPS_TARGET: &str = "deps-dev";

/// Default build argument carrying the project name
pub const DEFAULT_PROJECT_ARG: &str = "PROJECT";

/// Default install command, before the per-project flags
pub const DEFAULT_INSTALL_COMMAND: &[&str] = &["uv", "sync"];

/// Empty marker file created at the root of each placeholder package
pub const PLACEHOLDER_MARKER: &str = "README.md";

/// Module init file created inside each placeholder package
pub const PLACEHOLDER_INIT: &str = "__init__.py";

/// Files copied into the dependency context when present
pub const DEFAULT_EXTRA_CONTEXT_FILES: &[&str] = &[".python-version"];

/// Patterns excluded when copying source trees
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".venv",
    "__pycache__",
    "*.pyc",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    "*.egg-info",
];
