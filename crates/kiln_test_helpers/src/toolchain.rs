//! An in-memory stand-in for the compiler.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use kiln_common::normalize_path;
use kiln_toolchain::{Action, Invocation, ToolError, ToolOutput, Toolchain};

/// A [`Toolchain`] that behaves like a tiny C preprocessor and compiler.
///
/// - Dependency listings follow `#include "..."` lines transitively, looking
///   next to the including file first and then in every `-I` directory. A
///   missing header fails the listing the way a real compiler does.
/// - Compiles write a small text file at the object path.
/// - Links check that every object exists and write the target.
///
/// Every invocation is recorded, and individual sources (or the link) can
/// be told to fail.
#[derive(Default)]
pub struct ScriptedToolchain {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    log: Vec<Invocation>,
    fail_listing: HashSet<PathBuf>,
    fail_compile: HashSet<PathBuf>,
    fail_link: bool,
    warnings: HashMap<PathBuf, String>,
}

impl ScriptedToolchain {
    /// Creates a toolchain that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes the dependency listing of `source` exit 1.
    pub fn fail_listing(&self, source: impl AsRef<Path>) {
        self.state().fail_listing.insert(source.as_ref().to_path_buf());
    }

    /// Makes the compile of `source` exit 1 with a diagnostic.
    pub fn fail_compile(&self, source: impl AsRef<Path>) {
        self.state().fail_compile.insert(source.as_ref().to_path_buf());
    }

    /// Makes every link exit 1.
    pub fn fail_link(&self) {
        self.state().fail_link = true;
    }

    /// Makes the compile of `source` succeed but print `message` on stderr.
    pub fn warn_on(&self, source: impl AsRef<Path>, message: &str) {
        self.state()
            .warnings
            .insert(source.as_ref().to_path_buf(), message.to_string());
    }

    /// Every invocation so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state().log.clone()
    }

    /// Sources whose dependencies were listed, in order.
    pub fn listings(&self) -> Vec<PathBuf> {
        self.filter_log(|action| match action {
            Action::ListDependencies { source } => Some(source.clone()),
            _ => None,
        })
    }

    /// Sources that were compiled, in order.
    pub fn compiled(&self) -> Vec<PathBuf> {
        self.filter_log(|action| match action {
            Action::Compile { source, .. } => Some(source.clone()),
            _ => None,
        })
    }

    /// Number of link invocations.
    pub fn links(&self) -> usize {
        self.filter_log(|action| match action {
            Action::Link { target, .. } => Some(target.clone()),
            _ => None,
        })
        .len()
    }

    /// Forgets recorded invocations, keeping failure settings.
    pub fn clear(&self) {
        self.state().log.clear();
    }

    fn filter_log(&self, f: impl Fn(&Action) -> Option<PathBuf>) -> Vec<PathBuf> {
        self.state().log.iter().filter_map(|inv| f(&inv.action)).collect()
    }
}

impl Toolchain for ScriptedToolchain {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        let mut state = self.state();
        state.log.push(invocation.clone());
        let cwd = &invocation.cwd;
        let io_err = |source| ToolError::Spawn {
            program: invocation.program.clone(),
            source,
        };

        match &invocation.action {
            Action::ListDependencies { source } => {
                if state.fail_listing.contains(source) {
                    return Ok(ToolOutput::failure(
                        1,
                        format!("{}: error: scripted listing failure\n", source.display()),
                    ));
                }
                let dirs = include_dirs(&invocation.args);
                Ok(match scan(cwd, source, &dirs) {
                    Ok(headers) => ToolOutput::success(make_rule(source, &headers)),
                    Err(message) => ToolOutput::failure(1, message),
                })
            }
            Action::Compile { source, object } => {
                if state.fail_compile.contains(source) {
                    return Ok(ToolOutput::failure(
                        1,
                        format!("{}:1:1: error: scripted compile failure\n", source.display()),
                    ));
                }
                let path = cwd.join(object);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(io_err)?;
                }
                fs::write(&path, format!("object for {}\n", source.display())).map_err(io_err)?;
                let mut out = ToolOutput::success("");
                if let Some(warning) = state.warnings.get(source) {
                    out.stderr = warning.clone();
                }
                Ok(out)
            }
            Action::Link { objects, target } => {
                if state.fail_link {
                    return Ok(ToolOutput::failure(1, "ld: scripted link failure\n"));
                }
                if let Some(missing) = objects.iter().find(|o| !cwd.join(o).is_file()) {
                    return Ok(ToolOutput::failure(
                        1,
                        format!("ld: cannot find {}\n", missing.display()),
                    ));
                }
                let path = cwd.join(target);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(io_err)?;
                }
                let listing: Vec<String> = objects.iter().map(|o| o.display().to_string()).collect();
                fs::write(&path, listing.join("\n")).map_err(io_err)?;
                Ok(ToolOutput::success(""))
            }
        }
    }
}

fn include_dirs(args: &[String]) -> Vec<PathBuf> {
    args.iter()
        .filter_map(|a| a.strip_prefix("-I"))
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Follows quoted includes from `source`, returning headers in first-seen order.
fn scan(cwd: &Path, source: &Path, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut headers = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::from([normalize_path(source)]);
    let mut queue = VecDeque::from([source.to_path_buf()]);

    while let Some(file) = queue.pop_front() {
        let text = fs::read_to_string(cwd.join(&file)).map_err(|_| {
            format!("fatal error: {}: No such file or directory\n", file.display())
        })?;
        for name in quoted_includes(&text) {
            let beside = file.parent().map(|p| p.join(name));
            let found = beside
                .into_iter()
                .chain(dirs.iter().map(|d| d.join(name)))
                .map(|c| normalize_path(&c))
                .find(|c| cwd.join(c).is_file())
                .ok_or_else(|| {
                    format!(
                        "{}:1:10: fatal error: {}: No such file or directory\n",
                        file.display(),
                        name
                    )
                })?;
            if seen.insert(found.clone()) {
                headers.push(found.clone());
                queue.push_back(found);
            }
        }
    }
    Ok(headers)
}

fn quoted_includes(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|line| {
        let rest = line.trim_start().strip_prefix('#')?.trim_start();
        let rest = rest.strip_prefix("include")?.trim_start();
        let rest = rest.strip_prefix('"')?;
        rest.split('"').next()
    })
}

fn make_rule(source: &Path, headers: &[PathBuf]) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut rule = format!("{stem}.o: {}", escape(source));
    for header in headers {
        rule.push_str(" \\\n  ");
        rule.push_str(&escape(header));
    }
    rule.push('\n');
    rule
}

fn escape(path: &Path) -> String {
    path.to_string_lossy().replace(' ', "\\ ")
}
