//! Shared test utilities

#![allow(dead_code)]

mod mock_hosting;
mod scripted_runner;

pub use mock_hosting::{CreateIssueCall, MockHostingService, make_repository};
pub use scripted_runner::ScriptedRunner;

use merge_bot::config::{BotConfig, ConfigFile, ConfigOverrides, resolve};
use merge_bot::types::BranchMapping;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const UPSTREAM: &str = "operator-framework/operator-sdk";
pub const DOWNSTREAM: &str = "openshift/ocp-release-operator-sdk";

/// A work directory that already looks like a clone (contains `.git`)
pub struct TempClone {
    pub dir: TempDir,
}

impl TempClone {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Resolved configuration syncing `branches` into a work dir
pub fn bot_config(work_dir: &Path, branches: &[(&str, &str)]) -> BotConfig {
    let file = ConfigFile {
        upstream: Some(UPSTREAM.parse().unwrap()),
        downstream: Some(DOWNSTREAM.parse().unwrap()),
        branches: Some(merge_bot::config::BranchList::List(
            branches
                .iter()
                .map(|(s, t)| BranchMapping::new(*s, *t))
                .collect(),
        )),
        work_dir: Some(PathBuf::from(work_dir)),
        ..ConfigFile::default()
    };
    resolve(
        file,
        ConfigOverrides::default(),
        Path::new("bot_config.yaml"),
        Some("test-token".to_string()),
    )
    .unwrap()
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}
