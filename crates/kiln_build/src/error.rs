//! Error types for the build.

use std::path::PathBuf;

use kiln_graph::GraphError;
use kiln_toolchain::ToolError;

/// Errors that abort a build or clean.
///
/// Compile and link failures carry the tool's output verbatim so the user
/// can diagnose them without re-running anything.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Dependency discovery or header resolution failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The compiler or linker could not be run at all.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The compiler exited non-zero.
    #[error("failed to compile {source_file} (exit status {status}):\n{output}")]
    CompileFailed {
        /// The source being compiled.
        source_file: PathBuf,
        /// Exit status as text.
        status: String,
        /// The compiler's captured output.
        output: String,
    },

    /// The linker exited non-zero.
    #[error("failed to link {target} (exit status {status}):\n{output}")]
    LinkFailed {
        /// The executable being linked.
        target: PathBuf,
        /// Exit status as text.
        status: String,
        /// The linker's captured output.
        output: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compilation database or manifest could not be serialized.
    #[error("failed to serialize {path}: {reason}")]
    Serialization {
        /// The file being written.
        path: PathBuf,
        /// The serializer's message.
        reason: String,
    },

    /// `clean` was asked to delete a directory that is not safely inside the project.
    #[error("refusing to delete {path}: object directory must be a subdirectory of the project")]
    UnsafeClean {
        /// The directory that would have been deleted.
        path: PathBuf,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BuildError::Io { path, source }
    }
}
