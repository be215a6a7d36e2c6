//! `kiln clean`: removes the object directory and the executable.

use crate::pipeline::load_project;
use crate::{status, GlobalArgs};

/// Runs the `kiln clean` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, layout) = load_project(global)?;
    let report = kiln_build::clean(&layout)?;

    if report.removed.is_empty() {
        status(global, "Clean", "nothing to remove");
    }
    for path in &report.removed {
        status(global, "Removing", path.display());
    }
    Ok(0)
}
