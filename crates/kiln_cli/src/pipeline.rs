//! Shared helpers for CLI commands: locating the project and loading its layout.

use std::path::{Path, PathBuf};

use kiln_config::{
    find_config_file, load_config_file, resolve_layout, ProjectConfig, ProjectLayout,
};
use tracing::debug;

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory with a kiln config file.
///
/// Returns the directory containing the file, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if find_config_file(&current).is_some() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find kiln.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root and configuration file from global CLI args.
///
/// If `--config` names a file, its directory is the project root. If it names
/// a directory, that directory is searched. Otherwise the search walks up
/// from the current directory.
pub fn resolve_config_path(
    global: &GlobalArgs,
) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    let root = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let root = match p.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                return Ok((root, p));
            }
            p
        }
        None => find_project_root(&std::env::current_dir()?)?,
    };
    let file = find_config_file(&root)
        .ok_or_else(|| format!("no kiln.toml found in {}", root.display()))?;
    Ok((root, file))
}

/// Loads the configuration and resolves it against the project root.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(ProjectConfig, ProjectLayout), Box<dyn std::error::Error>> {
    let (root, file) = resolve_config_path(global)?;
    debug!(config = %file.display(), "loading project configuration");
    let config = load_config_file(&file)?;
    let layout = resolve_layout(&config, &root)?;
    Ok((config, layout))
}
