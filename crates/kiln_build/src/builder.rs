//! Build Orchestrator.

use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use kiln_config::ProjectLayout;
use kiln_graph::{DependencyGraph, GraphBuilder};
use kiln_toolchain::{CommandBuilder, Toolchain};
use tracing::{debug, info, warn};

use crate::compdb::{compile_commands_current, write_compile_commands};
use crate::error::BuildError;
use crate::manifest::BuildManifest;
use crate::staleness::{CompileReason, LinkReason, StalenessEvaluator};

/// Progress notifications, delivered as the build proceeds.
#[derive(Debug)]
pub enum BuildEvent<'a> {
    /// A unit is about to be compiled.
    Compiling {
        /// The source being compiled.
        source: &'a Path,
        /// Why it is out of date.
        reason: &'a CompileReason,
    },
    /// A unit is up to date.
    Fresh {
        /// The source that was skipped.
        source: &'a Path,
    },
    /// A compile succeeded but printed diagnostics.
    Warning {
        /// The source that was compiled.
        source: &'a Path,
        /// The compiler's output.
        output: &'a str,
    },
    /// The executable is about to be linked.
    Linking {
        /// The executable.
        target: &'a Path,
        /// Why it is out of date.
        reason: &'a LinkReason,
    },
    /// The compilation database was rewritten.
    CompileCommands {
        /// Where it was written.
        path: &'a Path,
    },
}

/// Diagnostics printed by a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
    /// The source that was compiled.
    pub source: PathBuf,
    /// The compiler's output, verbatim.
    pub output: String,
}

/// What a successful build did.
#[derive(Debug)]
pub struct BuildReport {
    /// The dependency graph the build worked from.
    pub graph: DependencyGraph,
    /// Sources compiled in this run, in order.
    pub compiled: Vec<PathBuf>,
    /// Sources that were already up to date.
    pub fresh: Vec<PathBuf>,
    /// Compiles that succeeded with output.
    pub warnings: Vec<CompileWarning>,
    /// Whether the executable was linked in this run.
    pub linked: bool,
    /// The compilation database, if it was written in this run.
    pub compile_commands: Option<PathBuf>,
}

impl BuildReport {
    /// Returns `true` if any compile printed diagnostics.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns `true` if nothing was compiled or linked.
    pub fn is_noop(&self) -> bool {
        self.compiled.is_empty() && !self.linked
    }
}

/// Runs one incremental build of a project.
///
/// Compiles run one at a time in discovery order and the first failure
/// aborts the build. The link, the compilation database and the manifest
/// are only written after every compile has succeeded.
pub struct Builder<'a, T> {
    layout: &'a ProjectLayout,
    toolchain: &'a T,
    observer: Option<Box<dyn FnMut(&BuildEvent<'_>) + 'a>>,
}

impl<'a, T: Toolchain> Builder<'a, T> {
    /// Creates a builder that runs tools through `toolchain`.
    pub fn new(layout: &'a ProjectLayout, toolchain: &'a T) -> Self {
        Self {
            layout,
            toolchain,
            observer: None,
        }
    }

    /// Registers a callback for progress events.
    pub fn with_observer(mut self, observer: impl FnMut(&BuildEvent<'_>) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&mut self, event: BuildEvent<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    /// Builds the project.
    pub fn run(mut self) -> Result<BuildReport, BuildError> {
        let layout = self.layout;
        let graph = GraphBuilder::new(layout, self.toolchain).build()?;
        info!(units = graph.len(), "dependency graph built");

        let object_root = layout.absolute(&layout.object_dir);
        let previous = BuildManifest::load_or_new(&object_root, env!("CARGO_PKG_VERSION"));
        let mut manifest = previous.clone();
        let commands = CommandBuilder::new(layout);

        let mut report = BuildReport {
            graph: DependencyGraph::default(),
            compiled: Vec::new(),
            fresh: Vec::new(),
            warnings: Vec::new(),
            linked: false,
            compile_commands: None,
        };

        for node in graph.nodes() {
            let invocation = commands.compile(&node.source, &node.object);
            let hash = ContentHash::from_args(&invocation.argv());
            let evaluator = StalenessEvaluator::new(layout, &previous);

            let Some(reason) = evaluator.compile_reason(node, hash) else {
                debug!(source = %node.source.display(), "fresh");
                self.emit(BuildEvent::Fresh {
                    source: &node.source,
                });
                manifest.units.insert(node.source.clone(), hash);
                report.fresh.push(node.source.clone());
                continue;
            };

            self.emit(BuildEvent::Compiling {
                source: &node.source,
                reason: &reason,
            });
            info!(source = %node.source.display(), %reason, "compiling");
            create_parent(&layout.absolute(&node.object))?;

            let output = self.toolchain.run(&invocation)?;
            if !output.is_success() {
                save_manifest(&manifest, &object_root);
                return Err(BuildError::CompileFailed {
                    source_file: node.source.clone(),
                    status: output.status_text(),
                    output: output.combined(),
                });
            }
            if output.has_output() {
                let text = output.combined();
                self.emit(BuildEvent::Warning {
                    source: &node.source,
                    output: &text,
                });
                report.warnings.push(CompileWarning {
                    source: node.source.clone(),
                    output: text,
                });
            }
            manifest.units.insert(node.source.clone(), hash);
            report.compiled.push(node.source.clone());
        }
        manifest.retain_units(graph.nodes().iter().map(|n| n.source.as_path()));

        if layout.skip_link {
            debug!("link step skipped by configuration");
        } else {
            let target = layout.exe_path();
            let objects = graph.objects();
            let invocation = commands.link(&objects, &target);
            let hash = ContentHash::from_args(&invocation.argv());
            let evaluator = StalenessEvaluator::new(layout, &previous);

            match evaluator.link_reason(&objects, !report.compiled.is_empty(), hash) {
                Some(reason) => {
                    self.emit(BuildEvent::Linking {
                        target: &target,
                        reason: &reason,
                    });
                    info!(target = %target.display(), %reason, "linking");
                    create_parent(&layout.absolute(&target))?;

                    let output = self.toolchain.run(&invocation)?;
                    if !output.is_success() {
                        manifest.link = None;
                        save_manifest(&manifest, &object_root);
                        return Err(BuildError::LinkFailed {
                            target,
                            status: output.status_text(),
                            output: output.combined(),
                        });
                    }
                    report.linked = true;
                }
                None => debug!(target = %target.display(), "executable up to date"),
            }
            manifest.link = Some(hash);
        }

        if layout.compile_commands
            && (!report.compiled.is_empty() || !compile_commands_current(layout, &graph))
        {
            let path = write_compile_commands(layout, &graph)?;
            self.emit(BuildEvent::CompileCommands { path: &path });
            report.compile_commands = Some(path);
        }

        save_manifest(&manifest, &object_root);
        report.graph = graph;
        Ok(report)
    }
}

fn create_parent(path: &Path) -> Result<(), BuildError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(BuildError::io(parent))
        }
        _ => Ok(()),
    }
}

/// The manifest is a cache; failing to write it only costs a rebuild.
fn save_manifest(manifest: &BuildManifest, object_root: &Path) {
    if let Err(e) = manifest.save(object_root) {
        warn!(error = %e, "could not save build manifest");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_test_helpers::{ScriptedToolchain, TestProject};

    const CONFIG: &str = "[build]\ncompiler = \"g++\"\nsource_main = \"main.cpp\"\n";

    fn project(config: &str) -> TestProject {
        let p = TestProject::new(config);
        p.write("src/main.cpp", "#include \"util.hpp\"\nint main() {}\n");
        p.write("include/util.hpp", "");
        p.write("src/util.cpp", "#include \"util.hpp\"\n");
        p
    }

    #[test]
    fn clean_build_compiles_and_links() {
        let p = project(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let report = Builder::new(&layout, &tc).run().unwrap();
        assert_eq!(
            report.compiled,
            vec![PathBuf::from("src/main.cpp"), PathBuf::from("src/util.cpp")]
        );
        assert!(report.linked);
        assert!(p.exists("build/main.o"));
        assert!(p.exists("build/util.o"));
        assert!(p.exists("bin/a.out"));
        assert!(p.exists("build/.kiln-manifest.json"));
        assert!(report.compile_commands.is_none());
    }

    #[test]
    fn compile_failure_aborts_before_link() {
        let p = project(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        tc.fail_compile("src/main.cpp");

        let err = Builder::new(&layout, &tc).run().unwrap_err();
        match err {
            BuildError::CompileFailed {
                source_file,
                output,
                ..
            } => {
                assert_eq!(source_file, PathBuf::from("src/main.cpp"));
                assert!(output.contains("scripted compile failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(tc.compiled(), vec![PathBuf::from("src/main.cpp")]);
        assert_eq!(tc.links(), 0);
        assert!(!p.exists("bin/a.out"));
    }

    #[test]
    fn link_failure_is_reported() {
        let p = project(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        tc.fail_link();

        let err = Builder::new(&layout, &tc).run().unwrap_err();
        assert!(matches!(err, BuildError::LinkFailed { ref target, .. } if target == Path::new("bin/a.out")));
        assert!(err.to_string().contains("scripted link failure"));
    }

    #[test]
    fn skip_link() {
        let p = project(&format!("{CONFIG}skip_link = true\n"));
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let report = Builder::new(&layout, &tc).run().unwrap();
        assert_eq!(report.compiled.len(), 2);
        assert!(!report.linked);
        assert_eq!(tc.links(), 0);
    }

    #[test]
    fn warnings_are_recorded() {
        let p = project(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        tc.warn_on("src/util.cpp", "src/util.cpp:1:1: warning: empty translation unit\n");

        let report = Builder::new(&layout, &tc).run().unwrap();
        assert!(report.has_warnings());
        assert_eq!(report.warnings[0].source, PathBuf::from("src/util.cpp"));
        assert!(report.warnings[0].output.contains("empty translation unit"));
    }

    #[test]
    fn observer_sees_progress() {
        let p = project(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        let mut seen = Vec::new();

        Builder::new(&layout, &tc)
            .with_observer(|event| {
                seen.push(match event {
                    BuildEvent::Compiling { source, .. } => format!("compile {}", source.display()),
                    BuildEvent::Fresh { source } => format!("fresh {}", source.display()),
                    BuildEvent::Linking { target, .. } => format!("link {}", target.display()),
                    BuildEvent::Warning { .. } => "warning".to_string(),
                    BuildEvent::CompileCommands { .. } => "compdb".to_string(),
                })
            })
            .run()
            .unwrap();
        assert_eq!(
            seen,
            vec![
                "compile src/main.cpp",
                "compile src/util.cpp",
                "link bin/a.out"
            ]
        );
    }

    #[test]
    fn changed_flags_rebuild_everything() {
        let p = project(CONFIG);
        let tc = ScriptedToolchain::new();
        Builder::new(&p.layout(), &tc).run().unwrap();

        p.write("kiln.toml", &format!("{CONFIG}compiler_flags = \"-O2\"\n"));
        tc.clear();
        let report = Builder::new(&p.layout(), &tc).run().unwrap();
        assert_eq!(report.compiled.len(), 2);
        assert!(report.linked);
    }

    #[test]
    fn compile_commands_written_when_missing() {
        let p = project(&format!("{CONFIG}compile_commands = true\n"));
        let tc = ScriptedToolchain::new();
        let report = Builder::new(&p.layout(), &tc).run().unwrap();
        assert!(report.compile_commands.is_some());

        let report = Builder::new(&p.layout(), &tc).run().unwrap();
        assert!(report.is_noop());
        assert!(report.compile_commands.is_none());

        p.remove("compile_commands.json");
        let report = Builder::new(&p.layout(), &tc).run().unwrap();
        assert!(report.compile_commands.is_some());
        assert!(p.exists("compile_commands.json"));
    }
}
