//! Removal of build outputs.

use std::path::{Component, PathBuf};

use kiln_config::ProjectLayout;
use tracing::info;

use crate::error::BuildError;

/// What `clean` removed, as root-relative paths.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Paths that existed and were deleted.
    pub removed: Vec<PathBuf>,
}

/// Deletes the object directory and the executable, each only if present.
///
/// Nothing else is touched: resources copied next to the executable stay.
pub fn clean(layout: &ProjectLayout) -> Result<CleanReport, BuildError> {
    let object_dir = &layout.object_dir;
    let inside_root = object_dir
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !inside_root || object_dir.as_os_str().is_empty() {
        return Err(BuildError::UnsafeClean {
            path: object_dir.clone(),
        });
    }

    let mut report = CleanReport::default();

    let objects = layout.absolute(object_dir);
    if objects.is_dir() {
        std::fs::remove_dir_all(&objects).map_err(BuildError::io(&objects))?;
        info!(path = %object_dir.display(), "removed object directory");
        report.removed.push(object_dir.clone());
    }

    let exe = layout.exe_path();
    let exe_abs = layout.absolute(&exe);
    if exe_abs.is_file() {
        std::fs::remove_file(&exe_abs).map_err(BuildError::io(&exe_abs))?;
        info!(path = %exe.display(), "removed executable");
        report.removed.push(exe);
    }

    Ok(report)
}
