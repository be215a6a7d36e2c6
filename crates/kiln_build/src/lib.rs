//! Incremental compile and link for kiln.
//!
//! [`Builder`] ties the pieces together: it builds the dependency graph,
//! asks the [`StalenessEvaluator`] which units are out of date, compiles
//! them in discovery order, links when needed, and keeps the compilation
//! database and the command manifest current.

#![warn(missing_docs)]

pub mod builder;
pub mod clean;
pub mod compdb;
pub mod error;
pub mod manifest;
pub mod staleness;

pub use builder::{BuildEvent, BuildReport, Builder, CompileWarning};
pub use clean::{clean, CleanReport};
pub use compdb::{compile_commands, compile_commands_current, write_compile_commands, CompileCommand};
pub use error::BuildError;
pub use manifest::BuildManifest;
pub use staleness::{CompileReason, LinkReason, StalenessEvaluator};
