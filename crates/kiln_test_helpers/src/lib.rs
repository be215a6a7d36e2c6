//! Test utilities and fixtures for kiln.
//!
//! [`TestProject`] is a throwaway project tree with explicit control over
//! file timestamps; [`ScriptedToolchain`] stands in for the compiler so that
//! graph and build tests run without one installed.

mod project;
mod toolchain;

pub use project::TestProject;
pub use toolchain::ScriptedToolchain;
