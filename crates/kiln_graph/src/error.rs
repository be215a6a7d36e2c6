//! Error types for dependency discovery and graph construction.

use std::path::PathBuf;

use kiln_toolchain::ToolError;

use crate::depfile::DepfileError;

/// Errors that abort graph construction.
///
/// Every variant names the offending file; discovery failures carry the
/// dependency-listing tool's output verbatim.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The dependency-listing tool could not be run.
    #[error("dependency discovery failed for {source_file}: {error}")]
    DiscoveryTool {
        /// The source whose dependencies were being listed.
        source_file: PathBuf,
        /// Why the tool could not run.
        #[source]
        error: ToolError,
    },

    /// The dependency-listing tool exited non-zero.
    #[error("dependency discovery failed for {source_file} (exit status {status}):\n{output}")]
    DiscoveryFailed {
        /// The source whose dependencies were being listed.
        source_file: PathBuf,
        /// Exit status as text (`"1"`, or `"signal"`).
        status: String,
        /// The tool's captured output.
        output: String,
    },

    /// The dependency listing was not a single make rule.
    #[error("dependency discovery failed for {source_file}: {reason}:\n{output}")]
    MalformedListing {
        /// The source whose dependencies were being listed.
        source_file: PathBuf,
        /// What was wrong with the listing.
        #[source]
        reason: DepfileError,
        /// The tool's captured standard output.
        output: String,
    },

    /// A header's override entry names a source that does not exist.
    #[error("header {header} is mapped to {source_file}, which does not exist")]
    MissingOverrideSource {
        /// The header whose override entry is wrong.
        header: PathBuf,
        /// The configured source that is missing.
        source_file: PathBuf,
    },

    /// The main source does not exist, or the seed glob matched nothing.
    #[error("main source {0} matched no files")]
    SeedNotFound(PathBuf),

    /// The seed glob pattern is malformed.
    #[error("invalid main source pattern {pattern}: {reason}")]
    InvalidSeedPattern {
        /// The pattern as configured.
        pattern: String,
        /// The glob parser's message.
        reason: String,
    },

    /// Two distinct sources would be compiled into the same object file.
    #[error("{first} and {second} both compile to {object}")]
    ObjectCollision {
        /// The shared object path.
        object: PathBuf,
        /// The source discovered first.
        first: PathBuf,
        /// The source discovered second.
        second: PathBuf,
    },
}

impl GraphError {
    /// Returns the file the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            GraphError::DiscoveryTool { source_file, .. }
            | GraphError::DiscoveryFailed { source_file, .. }
            | GraphError::MalformedListing { source_file, .. } => source_file,
            GraphError::MissingOverrideSource { source_file, .. } => source_file,
            GraphError::SeedNotFound(path) => path,
            GraphError::InvalidSeedPattern { pattern, .. } => std::path::Path::new(pattern),
            GraphError::ObjectCollision { second, .. } => second,
        }
    }
}
