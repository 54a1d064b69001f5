//! Scripted command runner for testing the sync engine without git

#![allow(dead_code)]

use merge_bot::git::{CommandFailure, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct Rule {
    prefix: Vec<String>,
    response: Result<String, CommandFailure>,
}

/// Records every command and answers from prefix-matched rules.
///
/// The first matching rule wins; unmatched commands succeed with empty
/// output. With the defaults, `show-ref` succeeds (every branch exists
/// locally), `git remote` lists nothing and `git status --porcelain`
/// reports a clean tree.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

fn owned(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_string()).collect()
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_rule(&self, prefix: &[&str], response: Result<String, CommandFailure>) {
        self.rules.lock().unwrap().push(Rule {
            prefix: owned(prefix),
            response,
        });
    }

    /// Succeed with `stdout` for commands starting with `prefix`
    pub fn respond(&self, prefix: &[&str], stdout: &str) {
        self.push_rule(prefix, Ok(stdout.to_string()));
    }

    /// Fail with exit status 1 and `stderr` for commands starting with `prefix`
    pub fn fail(&self, prefix: &[&str], stderr: &str) {
        self.push_rule(
            prefix,
            Err(CommandFailure {
                command: owned(prefix),
                status: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        );
    }

    /// Fail with exit status 1 and `stdout` (git reports "nothing to commit" there)
    pub fn fail_with_stdout(&self, prefix: &[&str], stdout: &str) {
        self.push_rule(
            prefix,
            Err(CommandFailure {
                command: owned(prefix),
                status: Some(1),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
    }

    /// Make `git commit` report that there is nothing to commit
    pub fn nothing_to_commit(&self) {
        self.fail_with_stdout(
            &["git", "commit"],
            "On branch master\nnothing to commit, working tree clean\n",
        );
    }

    /// Make every `show-ref` lookup fail (no branch exists anywhere)
    pub fn no_branches(&self) {
        self.fail(&["git", "show-ref"], "");
    }

    /// Every command line, joined with spaces
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, argv)| argv.join(" "))
            .collect()
    }

    /// Working directories of every call
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(dir, _)| dir.clone())
            .collect()
    }

    /// Whether a command line starting with `prefix` was run
    pub fn ran(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }

    /// Index of the first command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cwd: &Path, argv: &[String]) -> Result<String, CommandFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((cwd.to_path_buf(), argv.to_vec()));

        let rules = self.rules.lock().unwrap();
        let matched = rules
            .iter()
            .find(|rule| argv.starts_with(&rule.prefix));

        match matched {
            Some(Rule {
                response: Ok(stdout),
                ..
            }) => Ok(stdout.clone()),
            Some(Rule {
                response: Err(failure),
                ..
            }) => Err(CommandFailure {
                command: argv.to_vec(),
                ..failure.clone()
            }),
            None => Ok(String::new()),
        }
    }
}
