//! Lexical path normalization.
//!
//! The compiler reports dependency paths exactly as it reached them
//! (`src/../include/util.hpp`, `./include/util.hpp`, or absolute). Every path
//! the engine stores is first brought into one canonical, project-relative
//! form so that set membership and map lookups agree across spellings.

use std::path::{Component, Path, PathBuf};

/// Removes `.` components and folds `name/..` pairs without touching the
/// filesystem.
///
/// Leading `..` components that cannot be folded are preserved, and an
/// empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Converts `path` to its normalized form relative to `root`.
///
/// Absolute paths under `root` are stripped to a relative path; absolute
/// paths elsewhere (system headers) are returned normalized but absolute.
pub fn project_relative(root: &Path, path: &Path) -> PathBuf {
    let normalized = normalize_path(path);
    if normalized.is_absolute() {
        let root = normalize_path(root);
        if let Ok(rel) = normalized.strip_prefix(&root) {
            return normalize_path(rel);
        }
    }
    normalized
}
