//! Tool invocations and their captured results.

use std::path::PathBuf;

/// What an invocation is for, with the paths it reads and writes.
///
/// Real toolchains only need [`Invocation::program`] and
/// [`Invocation::args`]; the structured action lets alternative toolchains
/// act on the request without re-parsing a command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// List the headers a source depends on, as a make rule on stdout.
    ListDependencies {
        /// Source file, relative to the working directory.
        source: PathBuf,
    },
    /// Compile one source into one object.
    Compile {
        /// Source file, relative to the working directory.
        source: PathBuf,
        /// Object file, relative to the working directory.
        object: PathBuf,
    },
    /// Link objects into the executable.
    Link {
        /// Object files in link order.
        objects: Vec<PathBuf>,
        /// The executable to produce.
        target: PathBuf,
    },
}

/// A fully specified command: program, arguments and working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// The purpose of this invocation.
    pub action: Action,
    /// Executable name or path.
    pub program: String,
    /// Arguments, not including the program.
    pub args: Vec<String>,
    /// Working directory (the project root).
    pub cwd: PathBuf,
}

impl Invocation {
    /// Returns the program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Renders the command as a single shell-readable line for display.
    pub fn command_line(&self) -> String {
        self.argv()
            .iter()
            .map(|a| quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quotes an argument for display if it contains characters a shell would split on.
fn quote(arg: &str) -> String {
    if !arg.is_empty()
        && !arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '$' | '`'))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Captured result of a finished tool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// A successful result with the given standard output.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and standard error.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns `true` if the tool exited with status 0.
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Returns stdout and stderr concatenated, for verbatim reporting.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !out.is_empty() && !self.stderr.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }

    /// Exit status for display: the code, or `signal` if there was none.
    pub fn status_text(&self) -> String {
        self.status
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }

    /// Returns `true` if the tool printed anything at all.
    pub fn has_output(&self) -> bool {
        !self.stdout.trim().is_empty() || !self.stderr.trim().is_empty()
    }
}
