//! Platform-specific directory management
//!
//! Provides the cache directory where build contexts are staged before they
//! are handed to the container runtime.
//!
//! The `UVSTAGE_CACHE_DIR` environment variable overrides the default.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "UVSTAGE_CACHE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "uvstage";

/// Subdirectory for staged build contexts
const STAGING_SUBDIR: &str = "staging";

/// Platform-specific directory provider for uvstage
#[derive(Debug, Clone)]
pub struct UvstageDirs {
    cache_dir: PathBuf,
}

impl UvstageDirs {
    /// Create a new `UvstageDirs` instance
    ///
    /// Checks the environment variable first, then falls back to the
    /// platform default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: Self::resolve_cache_dir(),
        }
    }

    /// Use an explicit cache directory
    #[must_use]
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Get the cache directory path
    ///
    /// - Linux: `$XDG_CACHE_HOME/uvstage` or `~/.cache/uvstage`
    /// - macOS: `~/Library/Caches/uvstage`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Staging directory for one build invocation
    ///
    /// Unique per project and process so concurrent builds never share a
    /// context directory.
    #[must_use]
    pub fn staging_dir(&self, project: &str) -> PathBuf {
        self.cache_dir
            .join(STAGING_SUBDIR)
            .join(format!("{project}-{}", std::process::id()))
    }

    fn resolve_cache_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CACHE_DIR) {
            return PathBuf::from(path);
        }

        dirs::cache_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".cache").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
            })
    }
}

impl Default for UvstageDirs {
    fn default() -> Self {
        Self::new()
    }
}
