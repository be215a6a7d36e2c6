//! Mapping from source paths to object paths.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use kiln_config::ProjectLayout;

/// Subdirectory of the object root that holds objects for sources living
/// outside the source root.
pub const EXTERNAL_OBJECT_DIR: &str = "_ext";

/// Returns the object path for a root-relative source path.
///
/// Sources under the source root mirror their subdirectory under the object
/// root: `src/net/socket.cpp` becomes `build/net/socket.o`. A source with a
/// different extension than the configured one keeps its full file name,
/// `src/legacy.c` becomes `build/legacy.c.o`, so that it cannot collide with
/// `src/legacy.cpp`. Sources elsewhere in the project mirror their full
/// project-relative path under `build/_ext/`, with `..` spelled as `__`.
pub fn object_path(layout: &ProjectLayout, source: &Path) -> PathBuf {
    let (base, rel) = match strip_dir(source, &layout.source_dir) {
        Some(rel) => (layout.object_dir.clone(), rel),
        None => (
            layout.object_dir.join(EXTERNAL_OBJECT_DIR),
            escape_parents(source),
        ),
    };

    let file_name = object_file_name(&rel, &layout.source_ext, &layout.object_ext);
    match rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => base.join(parent).join(file_name),
        _ => base.join(file_name),
    }
}

/// Strips `dir` from `path`, treating `.` as the project root.
pub(crate) fn strip_dir(path: &Path, dir: &Path) -> Option<PathBuf> {
    if dir == Path::new(".") {
        return (!path.is_absolute() && !path.starts_with("..")).then(|| path.to_path_buf());
    }
    path.strip_prefix(dir).ok().map(Path::to_path_buf)
}

fn object_file_name(rel: &Path, source_ext: &str, object_ext: &str) -> OsString {
    let matches_ext = rel.extension().is_some_and(|e| e == source_ext);
    let stem = if matches_ext {
        rel.file_stem()
    } else {
        rel.file_name()
    }
    .unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(object_ext);
    name
}

fn escape_parents(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::ParentDir => Some(OsString::from("__")),
            Component::Normal(part) => Some(part.to_os_string()),
            _ => None,
        })
        .collect()
}
