//! Configuration and constants
//!
//! - [`defaults`] - Built-in default values
//! - [`settings`] - `uvstage.toml` loading and CLI overrides

pub mod defaults;
pub mod settings;
