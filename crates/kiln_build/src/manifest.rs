//! Build manifest that records the command each artifact was produced with.
//!
//! The manifest is stored as `.kiln-manifest.json` in the object directory.
//! Timestamps alone cannot see a changed flag or include path; comparing the
//! recorded command hash against the current one can.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Name of the manifest file within the object directory.
pub const MANIFEST_FILE: &str = ".kiln-manifest.json";

/// Command fingerprints for every unit and for the link step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Kiln version that wrote this manifest. Ignored on version change.
    pub kiln_version: String,

    /// Compile command hash per source, keyed by root-relative source path.
    pub units: BTreeMap<PathBuf, ContentHash>,

    /// Hash of the last successful link command.
    pub link: Option<ContentHash>,
}

impl BuildManifest {
    /// Creates an empty manifest for the given version.
    pub fn new(kiln_version: &str) -> Self {
        Self {
            kiln_version: kiln_version.to_string(),
            units: BTreeMap::new(),
            link: None,
        }
    }

    /// Loads the manifest from the object directory, returning `None` if the
    /// file doesn't exist or can't be parsed.
    ///
    /// This is fail-safe: any error is a cache miss and the build falls back
    /// to timestamps.
    pub fn load(object_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(object_dir.join(MANIFEST_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Loads a manifest written by `kiln_version`, or starts an empty one.
    pub fn load_or_new(object_dir: &Path, kiln_version: &str) -> Self {
        Self::load(object_dir)
            .filter(|m| m.is_compatible(kiln_version))
            .unwrap_or_else(|| Self::new(kiln_version))
    }

    /// Saves the manifest to the object directory, creating it if needed.
    pub fn save(&self, object_dir: &Path) -> Result<(), BuildError> {
        std::fs::create_dir_all(object_dir).map_err(BuildError::io(object_dir))?;
        let path = object_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| BuildError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(BuildError::io(path))
    }

    /// Returns `true` if this manifest was produced by a compatible version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.kiln_version == current_version
    }

    /// Drops entries for sources that are no longer part of the build.
    pub fn retain_units<'a>(&mut self, live: impl IntoIterator<Item = &'a Path>) {
        let live: std::collections::HashSet<&Path> = live.into_iter().collect();
        self.units.retain(|source, _| live.contains(source.as_path()));
    }
}
