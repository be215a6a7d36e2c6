//! Error types for resource synchronization.

use std::path::PathBuf;

/// A failure in one resource mapping.
///
/// Failures are collected per mapping; one failing mapping does not stop
/// the others from being synchronized.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The input path or pattern matched nothing.
    #[error("resource input {input} matched no files")]
    NoMatch {
        /// The configured input.
        input: String,
    },

    /// The input glob pattern is malformed.
    #[error("invalid resource pattern {input}: {reason}")]
    InvalidPattern {
        /// The configured input.
        input: String,
        /// The glob parser's message.
        reason: String,
    },

    /// A directory under the input could not be traversed.
    #[error("failed to read {path}: {reason}")]
    Walk {
        /// The path being traversed.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A file could not be copied.
    #[error("failed to copy {source_file} to {destination}: {error}")]
    Copy {
        /// The resource file.
        source_file: PathBuf,
        /// Where it was being copied.
        destination: PathBuf,
        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}
