//! Bot configuration
//!
//! The configuration is a YAML file (usually mounted from a ConfigMap),
//! layered with command-line overrides and the `GITHUB_ACCESS_TOKEN`
//! environment variable, then validated into a [`BotConfig`].

mod load;

pub use load::{DEFAULT_CONFIG_FILE, TOKEN_ENV_VAR, load_config, load_config_file};

use crate::error::{Error, Result};
use crate::types::{BranchMapping, CloneProtocol, PreCommitHook, RepoSlug};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Log verbosity accepted in the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Command lines and API calls
    Debug,
    /// Per-branch progress
    #[default]
    Info,
    /// Best-effort failures
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" => Ok(Self::Error),
            other => Err(Error::Config(format!("unknown log_level '{other}'"))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_filter().to_string()
    }
}

/// GitHub access token; never printed by `Debug`
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// The `branches` key: either a list of mappings or a `{source: target}` map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BranchList {
    /// `- {source: master, target: master, force_overlay: true}`
    List(Vec<BranchMapping>),
    /// `master: master`
    Map(serde_yaml::Mapping),
}

impl BranchList {
    /// Normalize into an ordered list of mappings
    pub fn into_mappings(self) -> Result<Vec<BranchMapping>> {
        match self {
            Self::List(list) => Ok(list),
            Self::Map(map) => map
                .into_iter()
                .map(|(source, target)| match (source.as_str(), target.as_str()) {
                    (Some(source), Some(target)) => Ok(BranchMapping::new(source, target)),
                    _ => Err(Error::Config(format!(
                        "branches entry {source:?}: {target:?} must map a branch name to a branch name"
                    ))),
                })
                .collect(),
        }
    }
}

/// Configuration file contents, every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Token for the GitHub API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_access_token: Option<String>,
    /// GitHub Enterprise host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_host: Option<String>,
    /// Repository to sync from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<RepoSlug>,
    /// Repository to sync into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downstream: Option<RepoSlug>,
    /// Downstream branch applied on top of every synced branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_branch: Option<String>,
    /// Log verbosity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    /// Branch mappings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<BranchList>,
    /// Issue assignees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Commands run before each sync commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_commit_hooks: Option<Vec<PreCommitHook>>,
    /// Local clone directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Protocol used to clone and fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_protocol: Option<CloneProtocol>,
    /// Stop at the first failed branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_on_error: Option<bool>,
    /// Do not push after a successful merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_push: Option<bool>,
    /// Do not file issues on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_issue: Option<bool>,
}

impl ConfigFile {
    /// Serializable form of a validated config, without the access token
    pub fn from_config(config: &BotConfig) -> Self {
        let flag = |on: bool| on.then_some(true);
        Self {
            github_access_token: None,
            github_host: config.github_host.clone(),
            upstream: Some(config.upstream.clone()),
            downstream: Some(config.downstream.clone()),
            overlay_branch: config.overlay_branch.clone(),
            log_level: Some(config.log_level),
            branches: Some(BranchList::List(config.branches.clone())),
            assignees: (!config.assignees.is_empty()).then(|| config.assignees.clone()),
            pre_commit_hooks: (!config.pre_commit_hooks.is_empty())
                .then(|| config.pre_commit_hooks.clone()),
            work_dir: config.work_dir.clone(),
            clone_protocol: Some(config.clone_protocol),
            exit_on_error: flag(config.behavior.exit_on_error),
            no_push: flag(config.behavior.no_push),
            no_issue: flag(config.behavior.no_issue),
        }
    }

    /// Render as YAML text
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replaces `upstream`
    pub upstream: Option<RepoSlug>,
    /// Replaces `downstream`
    pub downstream: Option<RepoSlug>,
    /// Replaces `overlay_branch`
    pub overlay_branch: Option<String>,
    /// Replaces the whole `branches` list with a single mapping
    pub branch: Option<BranchMapping>,
    /// Replaces `log_level`
    pub log_level: Option<LogLevel>,
    /// Turns on `exit_on_error`
    pub exit_on_error: bool,
    /// Turns on `no_push`
    pub no_push: bool,
    /// Turns on `no_issue`
    pub no_issue: bool,
}

/// Switches controlling failure handling and pushing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunBehavior {
    /// Abort the run at the first failure, leaving the work tree as-is
    pub exit_on_error: bool,
    /// Skip `git push`
    pub no_push: bool,
    /// Skip filing GitHub issues
    pub no_issue: bool,
    /// Only print the plan for each branch
    pub dry_run: bool,
}

/// Validated bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Token for the GitHub API (anonymous access when `None`)
    pub access_token: Option<AccessToken>,
    /// GitHub Enterprise host
    pub github_host: Option<String>,
    /// Repository to sync from
    pub upstream: RepoSlug,
    /// Repository to sync into
    pub downstream: RepoSlug,
    /// Downstream branch applied on top of every synced branch
    pub overlay_branch: Option<String>,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Branch mappings, processed in order
    pub branches: Vec<BranchMapping>,
    /// Issue assignees
    pub assignees: Vec<String>,
    /// Commands run before each sync commit
    pub pre_commit_hooks: Vec<PreCommitHook>,
    /// Local clone directory (defaults to the upstream repository name)
    pub work_dir: Option<PathBuf>,
    /// Protocol used to clone and fetch
    pub clone_protocol: CloneProtocol,
    /// Failure handling switches
    pub behavior: RunBehavior,
}

impl BotConfig {
    /// Directory holding the local clone
    pub fn work_dir_or(&self, default_name: &str) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_name))
    }
}

/// Apply overrides, resolve the token and validate.
///
/// `origin` names the config file in error messages. `env_token` is the
/// value of `GITHUB_ACCESS_TOKEN`, used when the file has no token.
pub fn resolve(
    file: ConfigFile,
    overrides: ConfigOverrides,
    origin: &Path,
    env_token: Option<String>,
) -> Result<BotConfig> {
    let required = |field: &str| {
        Error::Config(format!(
            "{field} is required, please add it to {}",
            origin.display()
        ))
    };

    let access_token = file
        .github_access_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| env_token.filter(|t| !t.trim().is_empty()))
        .map(AccessToken::new);

    let upstream = overrides
        .upstream
        .or(file.upstream)
        .ok_or_else(|| required("upstream"))?;
    let downstream = overrides
        .downstream
        .or(file.downstream)
        .ok_or_else(|| required("downstream"))?;

    let branches = match overrides.branch {
        Some(mapping) => vec![mapping],
        None => file
            .branches
            .map(BranchList::into_mappings)
            .transpose()?
            .unwrap_or_default(),
    };
    if branches.is_empty() {
        return Err(required("branches"));
    }
    validate_branches(&branches)?;

    let overlay_branch = overrides
        .overlay_branch
        .or(file.overlay_branch)
        .filter(|b| !b.trim().is_empty());

    let pre_commit_hooks = file.pre_commit_hooks.unwrap_or_default();
    validate_hooks(&pre_commit_hooks)?;

    Ok(BotConfig {
        access_token,
        github_host: file.github_host.filter(|h| !h.trim().is_empty()),
        upstream,
        downstream,
        overlay_branch,
        log_level: overrides.log_level.or(file.log_level).unwrap_or_default(),
        branches,
        assignees: file.assignees.unwrap_or_default(),
        pre_commit_hooks,
        work_dir: file.work_dir,
        clone_protocol: file.clone_protocol.unwrap_or_default(),
        behavior: RunBehavior {
            exit_on_error: overrides.exit_on_error || file.exit_on_error.unwrap_or(false),
            no_push: overrides.no_push || file.no_push.unwrap_or(false),
            no_issue: overrides.no_issue || file.no_issue.unwrap_or(false),
            dry_run: false,
        },
    })
}

fn validate_branches(branches: &[BranchMapping]) -> Result<()> {
    let mut targets = HashSet::new();
    for (index, mapping) in branches.iter().enumerate() {
        if mapping.source.trim().is_empty() || mapping.target.trim().is_empty() {
            return Err(Error::Config(format!(
                "branches[{index}]: source and target must be non-empty"
            )));
        }
        if !targets.insert(mapping.target.as_str()) {
            return Err(Error::Config(format!(
                "branches[{index}]: target '{}' is listed more than once",
                mapping.target
            )));
        }
    }
    Ok(())
}

fn validate_hooks(hooks: &[PreCommitHook]) -> Result<()> {
    for (index, hook) in hooks.iter().enumerate() {
        if hook.name.trim().is_empty() {
            return Err(Error::Config(format!(
                "pre_commit_hooks[{index}]: name must be non-empty"
            )));
        }
        if hook.command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(Error::Config(format!(
                "pre_commit_hooks[{index}] ({}): command must be non-empty",
                hook.name
            )));
        }
    }
    Ok(())
}
