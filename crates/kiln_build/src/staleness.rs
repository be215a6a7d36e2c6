//! Staleness Evaluator: timestamp rules, plus recorded command hashes.
//!
//! A unit needs compiling when its object is missing, strictly older than
//! its source or any header in its transitive set, or was produced by a
//! different command line. The executable needs linking when it is missing,
//! strictly older than any object, an object was recompiled this run, or
//! the link command changed.

use std::fmt;
use std::path::{Path, PathBuf};

use kiln_common::{ContentHash, FileStamp};
use kiln_config::ProjectLayout;
use kiln_graph::BuildNode;

use crate::manifest::BuildManifest;

/// Why a unit has to be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileReason {
    /// The object file does not exist.
    MissingObject,
    /// The source is newer than the object.
    SourceChanged,
    /// A header in the transitive set is newer than the object.
    HeaderChanged(PathBuf),
    /// The compile command differs from the one that produced the object.
    CommandChanged,
}

impl fmt::Display for CompileReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileReason::MissingObject => write!(f, "object missing"),
            CompileReason::SourceChanged => write!(f, "source changed"),
            CompileReason::HeaderChanged(h) => write!(f, "{} changed", h.display()),
            CompileReason::CommandChanged => write!(f, "command line changed"),
        }
    }
}

/// Why the executable has to be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReason {
    /// The executable does not exist.
    MissingTarget,
    /// An object is newer than the executable.
    ObjectChanged(PathBuf),
    /// At least one object was recompiled in this run.
    Recompiled,
    /// The link command differs from the one that produced the executable.
    CommandChanged,
}

impl fmt::Display for LinkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkReason::MissingTarget => write!(f, "executable missing"),
            LinkReason::ObjectChanged(o) => write!(f, "{} changed", o.display()),
            LinkReason::Recompiled => write!(f, "objects recompiled"),
            LinkReason::CommandChanged => write!(f, "command line changed"),
        }
    }
}

/// Decides which units and whether the link are out of date.
pub struct StalenessEvaluator<'a> {
    layout: &'a ProjectLayout,
    manifest: &'a BuildManifest,
}

impl<'a> StalenessEvaluator<'a> {
    /// Creates an evaluator that consults `manifest` for recorded commands.
    pub fn new(layout: &'a ProjectLayout, manifest: &'a BuildManifest) -> Self {
        Self { layout, manifest }
    }

    fn stamp(&self, rel: &Path) -> FileStamp {
        FileStamp::of(&self.layout.absolute(rel))
    }

    /// Returns why `node` must be compiled, or `None` if its object is fresh.
    ///
    /// `command` is the hash of the compile command that would be run. A unit
    /// with no recorded hash is judged by timestamps alone.
    pub fn compile_reason(&self, node: &BuildNode, command: ContentHash) -> Option<CompileReason> {
        let object = self.stamp(&node.object);
        if !object.exists() {
            return Some(CompileReason::MissingObject);
        }
        if object.is_older_than(self.stamp(&node.source)) {
            return Some(CompileReason::SourceChanged);
        }
        if let Some(header) = node
            .headers
            .iter()
            .chain(&node.implements)
            .find(|h| object.is_older_than(self.stamp(h)))
        {
            return Some(CompileReason::HeaderChanged(header.clone()));
        }
        match self.manifest.units.get(&node.source) {
            Some(recorded) if *recorded != command => Some(CompileReason::CommandChanged),
            _ => None,
        }
    }

    /// Returns why the executable must be linked, or `None` if it is fresh.
    pub fn link_reason(
        &self,
        objects: &[PathBuf],
        recompiled: bool,
        command: ContentHash,
    ) -> Option<LinkReason> {
        let target = self.stamp(&self.layout.exe_path());
        if !target.exists() {
            return Some(LinkReason::MissingTarget);
        }
        if recompiled {
            return Some(LinkReason::Recompiled);
        }
        if let Some(object) = objects
            .iter()
            .find(|o| target.is_older_than(self.stamp(o)))
        {
            return Some(LinkReason::ObjectChanged(object.clone()));
        }
        match self.manifest.link {
            Some(recorded) if recorded != command => Some(LinkReason::CommandChanged),
            _ => None,
        }
    }
}
