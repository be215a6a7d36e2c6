//! `kiln build`: dependency discovery, compile, link, and resource sync.
//!
//! 1. Find project root (walk up looking for `kiln.toml`)
//! 2. Load and resolve the configuration
//! 3. Build: discover the graph, compile stale units, link
//! 4. Synchronize resources, whether or not the build succeeded
//!
//! Exit status is 0 only if the build and every resource mapping succeeded.

use kiln_build::{BuildEvent, BuildReport, Builder};
use kiln_config::ProjectLayout;
use kiln_resources::{sync_resources, SyncReport};
use kiln_toolchain::ProcessToolchain;

use crate::pipeline::load_project;
use crate::{status, summary, BuildArgs, GlobalArgs};

/// Runs the `kiln build` command.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, mut layout) = load_project(global)?;
    apply_overrides(&mut layout, args);

    let name = if config.project.name.is_empty() {
        layout.exe_file.clone()
    } else {
        config.project.name.clone()
    };
    status(global, "Building", format!("{name} ({})", layout.root.display()));
    if global.verbose && !global.quiet {
        eprint!("{}", summary::render(&layout));
    }

    let mut code = 0;
    let toolchain = ProcessToolchain::new();
    let result = Builder::new(&layout, &toolchain)
        .with_observer(|event| report_event(global, event))
        .run();
    match result {
        Ok(report) => finish(global, &report),
        Err(e) => {
            eprintln!("error: {e}");
            code = 1;
        }
    }

    if !args.no_resources {
        let sync = sync_resources(&layout);
        if !report_sync(global, &sync) {
            code = 1;
        }
    }

    Ok(code)
}

fn apply_overrides(layout: &mut ProjectLayout, args: &BuildArgs) {
    if args.skip_link {
        layout.skip_link = true;
    }
    if args.compile_commands {
        layout.compile_commands = true;
    }
}

fn report_event(global: &GlobalArgs, event: &BuildEvent<'_>) {
    match event {
        BuildEvent::Compiling { source, reason } => {
            if global.verbose {
                status(global, "Compiling", format!("{} ({reason})", source.display()));
            } else {
                status(global, "Compiling", source.display());
            }
        }
        BuildEvent::Fresh { source } => {
            if global.verbose {
                status(global, "Fresh", source.display());
            }
        }
        BuildEvent::Warning { source, output } => {
            if !global.quiet {
                eprintln!("warning: {} produced diagnostics:", source.display());
                eprintln!("{}", output.trim_end());
            }
        }
        BuildEvent::Linking { target, reason } => {
            if global.verbose {
                status(global, "Linking", format!("{} ({reason})", target.display()));
            } else {
                status(global, "Linking", target.display());
            }
        }
        BuildEvent::CompileCommands { path } => status(global, "Writing", path.display()),
    }
}

fn finish(global: &GlobalArgs, report: &BuildReport) {
    for header in report.graph.unresolved_headers() {
        if global.verbose {
            status(
                global,
                "Note",
                format!("{} has no implementing source", header.display()),
            );
        }
    }

    let units = report.graph.len();
    let summary = if report.is_noop() {
        format!("{units} unit(s) up to date")
    } else {
        format!(
            "{} of {units} unit(s) compiled{}",
            report.compiled.len(),
            if report.linked { ", executable linked" } else { "" }
        )
    };
    if report.has_warnings() {
        status(global, "Finished", format!("{summary} with warnings"));
    } else {
        status(global, "Finished", summary);
    }
}

/// Prints the sync outcome and returns `true` if every mapping succeeded.
fn report_sync(global: &GlobalArgs, sync: &SyncReport) -> bool {
    for entry in &sync.copied {
        status(
            global,
            "Copying",
            format!("{} -> {}", entry.source.display(), entry.destination.display()),
        );
    }
    for failure in &sync.failures {
        eprintln!("error: {failure}");
    }
    sync.is_success()
}
