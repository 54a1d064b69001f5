//! Running git (and hook) commands against a local clone
//!
//! Commands go through the [`CommandRunner`] trait so the sync engine can be
//! exercised without a real repository.

mod workspace;

pub use workspace::Workspace;

use std::fmt;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// A command that could not be run or exited unsuccessfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Program and arguments
    pub command: Vec<String>,
    /// Exit status (`None` if the process could not be started or was killed)
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandFailure {
    /// Command line joined with spaces
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Whether either output stream contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.stdout.contains(needle) || self.stderr.contains(needle)
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command `{}` failed", self.command_line())?;
        match self.status {
            Some(code) => write!(f, " with exit status {code}")?,
            None => write!(f, " without an exit status")?,
        }
        let detail = self.stderr.trim();
        if !detail.is_empty() {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandFailure {}

/// Executes commands in a working directory
pub trait CommandRunner: Send + Sync {
    /// Run `argv` in `cwd`, returning stdout on success
    fn run(&self, cwd: &Path, argv: &[String]) -> Result<String, CommandFailure>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, cwd: &Path, argv: &[String]) -> Result<String, CommandFailure> {
        let failure = |status, stdout, stderr| CommandFailure {
            command: argv.to_vec(),
            status,
            stdout,
            stderr,
        };

        let Some((program, args)) = argv.split_first() else {
            return Err(failure(None, String::new(), "empty command".to_string()));
        };

        debug!(cwd = %cwd.display(), command = %argv.join(" "), "running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| failure(None, String::new(), format!("failed to start {program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(stdout)
        } else {
            debug!(status = ?output.status.code(), "command failed");
            Err(failure(output.status.code(), stdout, stderr))
        }
    }
}

/// Convert borrowed arguments to an owned argv
pub(crate) fn argv<S: AsRef<str>>(parts: &[S]) -> Vec<String> {
    parts.iter().map(|p| p.as_ref().to_string()).collect()
}
