//! `kiln config`: prints the resolved project configuration.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use kiln_config::ProjectLayout;

use crate::pipeline::load_project;
use crate::GlobalArgs;

/// Runs the `kiln config` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, layout) = load_project(global)?;
    print!("{}", render(&layout));
    Ok(0)
}

/// Renders the layout as an aligned, human-readable summary.
pub fn render(layout: &ProjectLayout) -> String {
    let mut out = String::new();
    let mut row = |key: &str, value: String| {
        let _ = writeln!(out, "  {:<18}{}", format!("{key}:"), value);
    };

    row("project root", layout.root.display().to_string());
    row("compiler", layout.compiler.clone());
    row("compiler flags", layout.compiler_flags.join(" "));
    row("linker flags", layout.linker_flags.join(" "));
    row("main source", layout.seed_pattern().display().to_string());
    row("sources", dir_with_ext(&layout.source_dir, &layout.source_ext));
    row("headers", dir_with_ext(&layout.header_dir, &layout.header_ext));
    row("objects", dir_with_ext(&layout.object_dir, &layout.object_ext));
    row("executable", layout.exe_path().display().to_string());
    row("include paths", join_paths(&layout.include_paths));
    row("library paths", join_paths(&layout.lib_paths));
    row("compile commands", yes_no(layout.compile_commands));
    row("skip link", yes_no(layout.skip_link));

    let mut text = format!("Configuration:\n{out}");

    if !layout.overrides.is_empty() {
        text.push_str("Header mappings:\n");
        for (header, sources) in &layout.overrides {
            let _ = writeln!(text, "  {}", header.display());
            for source in sources {
                let _ = writeln!(text, "    -> {}", source.display());
            }
        }
    }

    if !layout.resources.is_empty() {
        text.push_str("Resources:\n");
        for mapping in &layout.resources {
            let destination = under(&layout.exe_dir, &mapping.output);
            let _ = writeln!(text, "  {} -> {}", mapping.input, destination.display());
        }
    }

    text
}

fn dir_with_ext(dir: &Path, ext: &str) -> String {
    format!("{} (*.{ext})", dir.display())
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn under(base: &Path, rel: &Path) -> PathBuf {
    if rel == Path::new(".") {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}
