//! Expansion of resource mappings and conditional copying.

use std::fs;
use std::path::{Path, PathBuf};

use kiln_common::{normalize_path, FileStamp};
use kiln_config::{ProjectLayout, ResourceMapping};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ResourceError;

/// One concrete file to mirror, both paths relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// The resource file.
    pub source: PathBuf,
    /// Where it belongs under the executable directory.
    pub destination: PathBuf,
}

/// Outcome of synchronizing every mapping.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Entries that were copied.
    pub copied: Vec<ResourceEntry>,
    /// Entries whose destination was already current.
    pub up_to_date: Vec<ResourceEntry>,
    /// Mappings or copies that failed.
    pub failures: Vec<ResourceError>,
}

impl SyncReport {
    /// Returns `true` if no mapping failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Expands one mapping into concrete entries.
///
/// A plain file input is copied to `exe_dir/output`. A directory input is
/// mirrored recursively under `exe_dir/output`. Each match of a glob input is
/// placed under `exe_dir/output/<name>`, with directory matches mirrored
/// recursively below that.
pub fn plan_mapping(
    layout: &ProjectLayout,
    mapping: &ResourceMapping,
) -> Result<Vec<ResourceEntry>, ResourceError> {
    let out = normalize_path(&layout.exe_dir.join(&mapping.output));
    let mut entries = Vec::new();

    if is_glob(&mapping.input) {
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&layout.root.to_string_lossy()),
            mapping.input
        );
        let paths = glob::glob(&pattern).map_err(|e| ResourceError::InvalidPattern {
            input: mapping.input.clone(),
            reason: e.msg.to_string(),
        })?;
        let mut matches: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
        matches.sort();
        if matches.is_empty() {
            return Err(ResourceError::NoMatch {
                input: mapping.input.clone(),
            });
        }
        for path in matches {
            let Some(name) = path.file_name() else {
                continue;
            };
            expand(layout, &path, &out.join(name), &mut entries)?;
        }
    } else {
        let path = layout.absolute(Path::new(&mapping.input));
        if !path.exists() {
            return Err(ResourceError::NoMatch {
                input: mapping.input.clone(),
            });
        }
        expand(layout, &path, &out, &mut entries)?;
    }

    Ok(entries)
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn expand(
    layout: &ProjectLayout,
    source: &Path,
    destination: &Path,
    entries: &mut Vec<ResourceEntry>,
) -> Result<(), ResourceError> {
    if !source.is_dir() {
        entries.push(ResourceEntry {
            source: layout.key(source),
            destination: destination.to_path_buf(),
        });
        return Ok(());
    }

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| ResourceError::Walk {
            path: layout.key(source),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        entries.push(ResourceEntry {
            source: layout.key(entry.path()),
            destination: destination.join(rel),
        });
    }
    Ok(())
}

/// Synchronizes every configured mapping.
///
/// A failing mapping is recorded and the remaining mappings still run.
pub fn sync_resources(layout: &ProjectLayout) -> SyncReport {
    let mut report = SyncReport::default();
    for mapping in &layout.resources {
        let entries = match plan_mapping(layout, mapping) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(input = %mapping.input, error = %e, "resource mapping failed");
                report.failures.push(e);
                continue;
            }
        };
        for entry in entries {
            sync_entry(layout, entry, &mut report);
        }
    }
    report
}

fn sync_entry(layout: &ProjectLayout, entry: ResourceEntry, report: &mut SyncReport) {
    let source = layout.absolute(&entry.source);
    let destination = layout.absolute(&entry.destination);

    if !FileStamp::of(&destination).is_older_than(FileStamp::of(&source)) {
        debug!(destination = %entry.destination.display(), "resource up to date");
        report.up_to_date.push(entry);
        return;
    }

    let copied = match destination.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
    .and_then(|()| fs::copy(&source, &destination));

    match copied {
        Ok(_) => {
            info!(source = %entry.source.display(), destination = %entry.destination.display(), "copied resource");
            report.copied.push(entry);
        }
        Err(error) => report.failures.push(ResourceError::Copy {
            source_file: entry.source,
            destination: entry.destination,
            error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_test_helpers::TestProject;
    use std::time::{Duration, SystemTime};

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
    }

    fn project(resources: &str) -> TestProject {
        TestProject::new(&format!(
            "[build]\ncompiler = \"g++\"\nsource_main = \"main.cpp\"\n\n[resources]\n{resources}"
        ))
    }

    fn destinations(entries: &[ResourceEntry]) -> Vec<PathBuf> {
        entries.iter().map(|e| e.destination.clone()).collect()
    }

    #[test]
    fn directory_mapping_copies_only_outdated() {
        let p = project("\"res/images\" = \"dir/\"\n");
        p.write("res/images/a.png", "new a");
        p.write("res/images/b.png", "b");
        p.write("bin/dir/b.png", "old copy of b");
        p.set_mtime("res/images/a.png", t(10));
        p.set_mtime("res/images/b.png", t(10));
        p.set_mtime("bin/dir/b.png", t(10));

        let report = sync_resources(&p.layout());
        assert!(report.is_success());
        assert_eq!(destinations(&report.copied), vec![PathBuf::from("bin/dir/a.png")]);
        assert_eq!(
            destinations(&report.up_to_date),
            vec![PathBuf::from("bin/dir/b.png")]
        );
        assert_eq!(p.read("bin/dir/a.png"), "new a");
        assert_eq!(p.read("bin/dir/b.png"), "old copy of b");
    }

    #[test]
    fn newer_source_overwrites_destination() {
        let p = project("\"res/images\" = \"dir/\"\n");
        p.write("res/images/a.png", "v2");
        p.write("bin/dir/a.png", "v1");
        p.set_mtime("bin/dir/a.png", t(10));
        p.set_mtime("res/images/a.png", t(20));

        let report = sync_resources(&p.layout());
        assert_eq!(report.copied.len(), 1);
        assert_eq!(p.read("bin/dir/a.png"), "v2");

        let again = sync_resources(&p.layout());
        assert!(again.copied.is_empty());
        assert_eq!(again.up_to_date.len(), 1);
    }

    #[test]
    fn nested_directories_preserve_structure() {
        let p = project("\"assets\" = \"data\"\n");
        p.write("assets/levels/one.txt", "1");
        p.write("assets/levels/deep/two.txt", "2");
        p.write("assets/readme.md", "r");

        let entries = plan_mapping(&p.layout(), &p.layout().resources[0]).unwrap();
        let mut dests = destinations(&entries);
        dests.sort();
        assert_eq!(
            dests,
            vec![
                PathBuf::from("bin/data/levels/deep/two.txt"),
                PathBuf::from("bin/data/levels/one.txt"),
                PathBuf::from("bin/data/readme.md"),
            ]
        );
    }

    #[test]
    fn single_file_mapping() {
        let p = project("\"res/config.ini\" = \"settings.ini\"\n");
        p.write("res/config.ini", "x=1");
        let report = sync_resources(&p.layout());
        assert_eq!(
            report.copied,
            vec![ResourceEntry {
                source: PathBuf::from("res/config.ini"),
                destination: PathBuf::from("bin/settings.ini"),
            }]
        );
        assert_eq!(p.read("bin/settings.ini"), "x=1");
    }

    #[test]
    fn glob_mapping() {
        let p = project("\"res/sounds/*.wav\" = \"audio\"\n\"res/maps/*\" = \"maps\"\n");
        p.write("res/sounds/hit.wav", "");
        p.write("res/sounds/jump.wav", "");
        p.write("res/sounds/notes.txt", "");
        p.write("res/maps/forest/tiles.bin", "");
        p.write("res/maps/index.json", "");

        let report = sync_resources(&p.layout());
        assert!(report.is_success());
        let mut dests = destinations(&report.copied);
        dests.sort();
        assert_eq!(
            dests,
            vec![
                PathBuf::from("bin/audio/hit.wav"),
                PathBuf::from("bin/audio/jump.wav"),
                PathBuf::from("bin/maps/forest/tiles.bin"),
                PathBuf::from("bin/maps/index.json"),
            ]
        );
    }

    #[test]
    fn failing_mapping_does_not_stop_others() {
        let p = project("\"missing/dir\" = \"x\"\n\"res/*.none\" = \"y\"\n\"res/ok.txt\" = \"ok.txt\"\n");
        p.write("res/ok.txt", "ok");

        let report = sync_resources(&p.layout());
        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f, ResourceError::NoMatch { .. })));
        assert_eq!(p.read("bin/ok.txt"), "ok");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let p = project("\"res/[.png\" = \"x\"\n");
        let report = sync_resources(&p.layout());
        assert!(matches!(
            report.failures.as_slice(),
            [ResourceError::InvalidPattern { .. }]
        ));
    }
}
