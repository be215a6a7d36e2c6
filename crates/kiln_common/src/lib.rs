//! Shared foundational types used across the kiln build engine.
//!
//! This crate provides lexical path normalization, file modification stamps
//! used for staleness decisions, and content hashing for command fingerprints.

#![warn(missing_docs)]

pub mod hash;
pub mod path;
pub mod stamp;

pub use hash::ContentHash;
pub use path::{normalize_path, project_relative};
pub use stamp::FileStamp;
