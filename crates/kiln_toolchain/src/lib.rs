//! Compiler and linker invocation for kiln.
//!
//! The build engine never spawns a process directly. It describes what it
//! wants as an [`Invocation`] (a dependency listing, a compile, or a link) and
//! hands it to a [`Toolchain`]. [`ProcessToolchain`] runs the real compiler;
//! tests substitute an in-memory implementation.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod invocation;
pub mod process;

pub use command::CommandBuilder;
pub use error::ToolError;
pub use invocation::{Action, Invocation, ToolOutput};
pub use process::ProcessToolchain;

/// Executes compiler and linker invocations.
///
/// Implementations block until the tool exits. A tool that runs and exits
/// non-zero is reported through [`ToolOutput::status`], not as an `Err`;
/// `Err` is reserved for failing to run the tool at all.
pub trait Toolchain {
    /// Runs one invocation to completion and captures its output.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;
}

impl<T: Toolchain + ?Sized> Toolchain for &T {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        (**self).run(invocation)
    }
}

impl<T: Toolchain + ?Sized> Toolchain for Box<T> {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        (**self).run(invocation)
    }
}
