//! A toolchain backed by real child processes.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::ToolError;
use crate::invocation::{Invocation, ToolOutput};
use crate::Toolchain;

/// Runs invocations as blocking child processes.
///
/// Standard input is closed; standard output and error are captured
/// separately so that dependency listings are not polluted by warnings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessToolchain;

impl ProcessToolchain {
    /// Creates a process-backed toolchain.
    pub fn new() -> Self {
        Self
    }
}

impl Toolchain for ProcessToolchain {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        debug!(command = %invocation.command_line(), cwd = %invocation.cwd.display(), "spawning");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::invocation::Action;
    use std::path::PathBuf;

    fn sh(script: &str, cwd: PathBuf) -> Invocation {
        Invocation {
            action: Action::ListDependencies {
                source: PathBuf::from("x.cpp"),
            },
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd,
        }
    }

    #[test]
    fn captures_stdout_and_stderr_separately() {
        let dir = tempfile::tempdir().unwrap();
        let out = ProcessToolchain::new()
            .run(&sh("echo out; echo err 1>&2", dir.path().to_path_buf()))
            .unwrap();
        assert!(out.is_success());
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[test]
    fn reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let out = ProcessToolchain::new()
            .run(&sh("exit 3", dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(out.status, Some(3));
    }

    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let out = ProcessToolchain::new()
            .run(&sh("cat marker.txt", dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(out.stdout, "here");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = sh("true", dir.path().to_path_buf());
        inv.program = "kiln-definitely-not-a-compiler".to_string();
        let err = ProcessToolchain::new().run(&inv).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
