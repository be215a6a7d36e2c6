//! Resource Synchronizer.
//!
//! Mirrors the configured resource files and directories into the
//! executable directory, copying only entries whose destination is missing
//! or strictly older than the source. Independent of the compile graph.

#![warn(missing_docs)]

pub mod error;
pub mod sync;

pub use error::ResourceError;
pub use sync::{plan_mapping, sync_resources, ResourceEntry, SyncReport};
