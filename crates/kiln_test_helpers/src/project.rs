//! Temporary project trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use kiln_config::{load_config_file, resolve_layout, ProjectLayout};
use tempfile::TempDir;

/// A project directory that is deleted when dropped.
///
/// All paths taken by the methods are relative to the project root.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Creates a project whose `kiln.toml` has the given contents.
    pub fn new(config: &str) -> Self {
        let project = Self::empty();
        project.write("kiln.toml", config);
        project
    }

    /// Creates a project with no files at all.
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project dir"),
        }
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a project file.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes a file, creating parent directories.
    pub fn write(&self, rel: impl AsRef<Path>, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
    }

    /// Reads a file back as text.
    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        fs::read_to_string(self.path(rel)).expect("read project file")
    }

    /// Returns `true` if the file or directory exists.
    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.path(rel).exists()
    }

    /// Deletes a file.
    pub fn remove(&self, rel: impl AsRef<Path>) {
        fs::remove_file(self.path(rel)).expect("remove project file");
    }

    /// Returns a file's modification time.
    pub fn mtime(&self, rel: impl AsRef<Path>) -> SystemTime {
        fs::metadata(self.path(rel))
            .and_then(|m| m.modified())
            .expect("stat project file")
    }

    /// Sets a file's modification time.
    pub fn set_mtime(&self, rel: impl AsRef<Path>, time: SystemTime) {
        set_file_mtime(&self.path(rel), time);
    }

    /// Moves every file in the project one hour into the past.
    ///
    /// Call this between builds so that a following [`touch`](Self::touch)
    /// is strictly newer than everything the previous build produced.
    pub fn backdate_all(&self) {
        let past = SystemTime::now() - Duration::from_secs(3600);
        let mut dirs = vec![self.root().to_path_buf()];
        while let Some(dir) = dirs.pop() {
            for entry in fs::read_dir(&dir).expect("read project dir") {
                let path = entry.expect("read dir entry").path();
                if path.is_dir() {
                    dirs.push(path);
                } else {
                    set_file_mtime(&path, past);
                }
            }
        }
    }

    /// Marks a file as modified now.
    pub fn touch(&self, rel: impl AsRef<Path>) {
        self.set_mtime(rel, SystemTime::now());
    }

    /// Loads and resolves the project's configuration file.
    pub fn layout(&self) -> ProjectLayout {
        let config = kiln_config::find_config_file(self.root())
            .map(|path| load_config_file(&path))
            .expect("project has a config file")
            .expect("config file is valid");
        resolve_layout(&config, self.root()).expect("resolve project layout")
    }
}

fn set_file_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(time))
        .expect("set file mtime");
}
