//! Core business logic module
//!
//! # Submodules
//!
//! - [`lockfile`] - Lock file (uv.lock) parsing
//! - [`pyproject`] - Package manifest (pyproject.toml) parsing
//! - [`resolver`] - Local dependency resolution
//! - [`container`] - Build context and container description values
//! - [`stage`] - Staged build orchestration

pub mod container;
pub mod lockfile;
pub mod pyproject;
pub mod resolver;
pub mod stage;
