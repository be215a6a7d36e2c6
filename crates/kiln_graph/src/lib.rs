//! Dependency discovery and graph construction.
//!
//! Starting from the main source (or every source a seed glob matches), the
//! [`GraphBuilder`] asks the compiler which headers each source includes
//! ([`Discoverer`]), maps each header to the sources that implement it
//! ([`HeaderResolver`]), and repeats until no new source appears. The result
//! is a [`DependencyGraph`]: an arena of [`BuildNode`]s in discovery order.

#![warn(missing_docs)]

pub mod depfile;
pub mod discover;
pub mod error;
pub mod graph;
pub mod object;
pub mod resolve;

pub use depfile::parse_make_rule;
pub use discover::Discoverer;
pub use error::GraphError;
pub use graph::{BuildNode, DependencyGraph, GraphBuilder, NodeId};
pub use object::object_path;
pub use resolve::{HeaderResolver, Resolution};
