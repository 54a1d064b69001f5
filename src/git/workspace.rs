//! A local clone of the downstream repository.

use super::{CommandFailure, CommandRunner, argv};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Local git checkout driven through a [`CommandRunner`]
#[derive(Clone)]
pub struct Workspace {
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Use an existing checkout at `root`
    pub fn open(root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    /// Reuse `dir` if it is already a checkout, otherwise clone `url` into it
    pub fn clone_or_open(runner: Arc<dyn CommandRunner>, url: &str, dir: &Path) -> Result<Self> {
        if dir.join(".git").exists() {
            info!(dir = %dir.display(), "reusing existing clone");
            return Ok(Self::open(dir, runner));
        }

        let Some(name) = dir.file_name() else {
            return Err(Error::Config(format!(
                "work_dir '{}' does not name a directory",
                dir.display()
            )));
        };
        let parent = match dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        // The clone runs inside `parent`, so only the last component is passed
        info!(url, dir = %dir.display(), "cloning repository");
        let name = name.to_string_lossy();
        runner.run(&parent, &argv(&["git", "clone", url, name.as_ref()]))?;

        Ok(Self::open(dir, runner))
    }

    /// Root directory of the checkout
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a git subcommand
    pub fn git(&self, args: &[&str]) -> std::result::Result<String, CommandFailure> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("git".to_string());
        full.extend(args.iter().map(|a| (*a).to_string()));
        self.exec(&full)
    }

    /// Run an arbitrary program in the checkout
    pub fn exec(&self, argv: &[String]) -> std::result::Result<String, CommandFailure> {
        self.runner.run(&self.root, argv)
    }

    /// Whether `refs/heads/<branch>` exists
    pub fn has_local_branch(&self, branch: &str) -> bool {
        self.has_ref(&format!("refs/heads/{branch}"))
    }

    /// Whether `refs/remotes/<remote>/<branch>` exists
    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> bool {
        self.has_ref(&format!("refs/remotes/{remote}/{branch}"))
    }

    fn has_ref(&self, full_ref: &str) -> bool {
        self.git(&["show-ref", "--verify", "--quiet", full_ref])
            .is_ok()
    }

    /// Names of configured remotes
    pub fn remotes(&self) -> std::result::Result<Vec<String>, CommandFailure> {
        Ok(self
            .git(&["remote"])?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Add remote `name` unless it already exists; returns whether it was added
    pub fn ensure_remote(&self, name: &str, url: &str) -> std::result::Result<bool, CommandFailure> {
        if self.remotes()?.iter().any(|r| r == name) {
            debug!(remote = name, "remote already configured");
            return Ok(false);
        }
        self.git(&["remote", "add", name, url])?;
        info!(remote = name, url, "added remote");
        Ok(true)
    }

    /// Fetch all branches of a remote
    pub fn fetch(&self, remote: &str) -> std::result::Result<(), CommandFailure> {
        info!(remote, "fetching");
        self.git(&["fetch", remote])?;
        Ok(())
    }

    /// Whether a path relative to the checkout root exists
    pub fn file_exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    /// Write a file relative to the checkout root
    pub fn write_file(&self, relative: &str, contents: &str) -> std::io::Result<()> {
        fs::write(self.root.join(relative), contents)
    }

    /// Whether the work tree and index have no changes
    pub fn is_clean(&self) -> std::result::Result<bool, CommandFailure> {
        Ok(self.git(&["status", "--porcelain"])?.trim().is_empty())
    }

    /// Stdout of a command, or a description of its failure
    pub fn capture(&self, argv: &[&str]) -> String {
        match self.exec(&super::argv(argv)) {
            Ok(out) => out.trim_end().to_string(),
            Err(failure) => format!(
                "<{failure}>\n{}",
                failure.stdout.trim_end()
            )
            .trim_end()
            .to_string(),
        }
    }

    /// Abort any merge and discard local changes.
    ///
    /// Every step is attempted even if an earlier one fails.
    pub fn cleanup(&self) {
        let steps: [&[&str]; 3] = [
            &["merge", "--abort"],
            &["reset", "--hard", "HEAD"],
            &["clean", "-f"],
        ];
        for args in steps {
            if let Err(failure) = self.git(args) {
                // merge --abort fails routinely when no merge is in progress
                debug!(%failure, "cleanup step failed");
                if args[0] != "merge" {
                    warn!(%failure, "failed to clean work tree");
                }
            }
        }
    }
}
