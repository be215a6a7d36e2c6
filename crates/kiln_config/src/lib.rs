//! Parsing and validation of `kiln.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`], then resolves it against the project root into a
//! [`ProjectLayout`] with normalized directories and header overrides.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    find_config_file, load_config, load_config_file, load_config_from_str,
    load_config_from_yaml_str, CONFIG_FILE_NAMES,
};
pub use resolve::{resolve_layout, ProjectLayout, ResourceMapping};
pub use types::*;
