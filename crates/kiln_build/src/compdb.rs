//! Compilation database (`compile_commands.json`).
//!
//! The database is always regenerated in full from the current graph, so it
//! describes every unit, not just the ones compiled in this run.

use std::path::PathBuf;

use kiln_config::ProjectLayout;
use kiln_graph::DependencyGraph;
use kiln_toolchain::CommandBuilder;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// One entry of the Clang JSON compilation database format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// Working directory of the compile.
    pub directory: PathBuf,
    /// Absolute path of the source.
    pub file: PathBuf,
    /// The compile command, program first.
    pub arguments: Vec<String>,
    /// Object path, relative to `directory`.
    pub output: PathBuf,
}

/// Returns one entry per unit, in discovery order.
pub fn compile_commands(layout: &ProjectLayout, graph: &DependencyGraph) -> Vec<CompileCommand> {
    let commands = CommandBuilder::new(layout);
    graph
        .nodes()
        .iter()
        .map(|node| {
            let invocation = commands.compile(&node.source, &node.object);
            CompileCommand {
                directory: invocation.cwd.clone(),
                file: layout.absolute(&node.source),
                arguments: invocation.argv(),
                output: node.object.clone(),
            }
        })
        .collect()
}

/// Returns `true` if the database on disk describes exactly the current graph.
///
/// A missing or unreadable file is never current.
pub fn compile_commands_current(layout: &ProjectLayout, graph: &DependencyGraph) -> bool {
    let Ok(text) = std::fs::read_to_string(layout.compile_commands_path()) else {
        return false;
    };
    match serde_json::from_str::<Vec<CompileCommand>>(&text) {
        Ok(on_disk) => on_disk == compile_commands(layout, graph),
        Err(_) => false,
    }
}

/// Writes the database to the project root and returns its path.
pub fn write_compile_commands(
    layout: &ProjectLayout,
    graph: &DependencyGraph,
) -> Result<PathBuf, BuildError> {
    let path = layout.compile_commands_path();
    let json = serde_json::to_string_pretty(&compile_commands(layout, graph)).map_err(|e| {
        BuildError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        }
    })?;
    std::fs::write(&path, json).map_err(BuildError::io(&path))?;
    Ok(path)
}
