//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, repository access and the
//! container runtime.

pub mod dirs;
pub mod docker;
pub mod filesystem;
pub mod repo;
