//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::{Path, PathBuf};

/// Configuration file names searched in a project directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["kiln.toml", "kiln.yaml", "kiln.yml"];

/// Returns the configuration file inside `project_dir`, if one exists.
pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// Loads and validates the configuration from a project directory.
///
/// Reads the first of `kiln.toml`, `kiln.yaml`, `kiln.yml` that exists.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = find_config_file(project_dir)
        .ok_or_else(|| ConfigError::NotFound(project_dir.to_path_buf()))?;
    load_config_file(&path)
}

/// Loads and validates a configuration file, choosing the format by extension.
///
/// `.yaml` and `.yml` files are parsed as YAML, everything else as TOML.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_config_from_yaml_str(&content),
        _ => load_config_from_str(&content),
    }
}

/// Parses and validates a TOML configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Parses and validates a YAML configuration from a string.
pub fn load_config_from_yaml_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    let build = &config.build;
    if build.compiler.trim().is_empty() {
        return Err(ConfigError::MissingField("build.compiler".to_string()));
    }
    if build.source_main.trim().is_empty() {
        return Err(ConfigError::MissingField("build.source_main".to_string()));
    }
    for (field, ext) in [
        ("source_ext", &build.source_ext),
        ("header_ext", &build.header_ext),
        ("object_ext", &build.object_ext),
    ] {
        validate_extension(field, ext)?;
    }
    if build.exe_file.is_empty() || build.exe_file.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "exe_file must be a plain file name, got '{}'",
            build.exe_file
        )));
    }
    if kiln_common::normalize_path(Path::new(&build.object_dir))
        == kiln_common::normalize_path(Path::new(&build.source_dir))
    {
        return Err(ConfigError::ValidationError(
            "object_dir must differ from source_dir".to_string(),
        ));
    }
    for (header, sources) in &config.depend_mapping {
        if sources.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "depend_mapping entry '{header}' lists no sources"
            )));
        }
    }
    Ok(())
}

fn validate_extension(field: &str, ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not be empty"
        )));
    }
    if ext.starts_with('.') {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not start with '.', got '{ext}'"
        )));
    }
    if ext.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not contain path separators, got '{ext}'"
        )));
    }
    Ok(())
}
