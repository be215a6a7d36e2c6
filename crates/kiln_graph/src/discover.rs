//! Dependency Discoverer: asks the compiler which headers a source includes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use kiln_config::ProjectLayout;
use kiln_toolchain::{CommandBuilder, Toolchain};
use tracing::debug;

use crate::depfile::parse_make_rule;
use crate::error::GraphError;

/// Runs the compiler's dependency-listing mode and parses the result.
pub struct Discoverer<'a, T> {
    layout: &'a ProjectLayout,
    toolchain: &'a T,
}

impl<'a, T: Toolchain> Discoverer<'a, T> {
    /// Creates a discoverer that runs listings through `toolchain`.
    pub fn new(layout: &'a ProjectLayout, toolchain: &'a T) -> Self {
        Self { layout, toolchain }
    }

    /// Returns the headers `source` depends on, direct and transitive.
    ///
    /// `source` is root-relative. The returned paths are normalized and
    /// root-relative (absolute for headers outside the project), in the
    /// order the compiler listed them, without the source itself.
    pub fn headers(&self, source: &Path) -> Result<Vec<PathBuf>, GraphError> {
        let invocation = CommandBuilder::new(self.layout).list_dependencies(source);
        let output =
            self.toolchain
                .run(&invocation)
                .map_err(|error| GraphError::DiscoveryTool {
                    source_file: source.to_path_buf(),
                    error,
                })?;

        if !output.is_success() {
            return Err(GraphError::DiscoveryFailed {
                source_file: source.to_path_buf(),
                status: output.status_text(),
                output: output.combined(),
            });
        }

        let prerequisites =
            parse_make_rule(&output.stdout).map_err(|reason| GraphError::MalformedListing {
                source_file: source.to_path_buf(),
                reason,
                output: output.stdout.clone(),
            })?;

        let source_key = self.layout.key(source);
        let mut seen = HashSet::new();
        let headers: Vec<PathBuf> = prerequisites
            .iter()
            .map(|p| self.layout.key(p))
            .filter(|p| *p != source_key)
            .filter(|p| seen.insert(p.clone()))
            .collect();

        debug!(source = %source.display(), headers = headers.len(), "listed dependencies");
        Ok(headers)
    }
}
