//! uvstage - cache-aware container builds for uv monorepo projects
//!
//! Given a repository checkout, a project name and the workspace lock file,
//! uvstage works out which in-repo packages the project depends on and
//! builds a container image in three phases so that source edits do not
//! invalidate the dependency layers.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Lock file model, dependency resolution and build staging
//! - [`infra`] - Infrastructure layer (filesystem, repository, container runtime)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
