//! Error types for running external tools.

/// Errors raised when a tool cannot be run at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The process could not be spawned (missing executable, permissions).
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        /// The program that was being run.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
