//! Core types for merge-bot

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

static SLUG_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap_or_else(|e| panic!("invalid slug regex: {e}"))
});

/// A GitHub repository identifier (`owner/repo`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSlug {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoSlug {
    /// Create a slug from already-validated parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = Error;

    /// Parse `owner/repo`, `https://host/owner/repo(.git)` or
    /// `git@host:owner/repo(.git)`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSlug(s.to_string());
        let trimmed = s.trim().trim_end_matches('/');

        let path = if let Some(rest) = trimmed.strip_prefix("git@") {
            rest.split_once(':').map(|(_, path)| path.to_string())
        } else if trimmed.contains("://") {
            Url::parse(trimmed)
                .ok()
                .map(|url| url.path().trim_matches('/').to_string())
        } else {
            Some(trimmed.to_string())
        }
        .ok_or_else(invalid)?;

        let path = path.strip_suffix(".git").unwrap_or(&path);
        let (owner, name) = path.split_once('/').ok_or_else(invalid)?;

        if !SLUG_COMPONENT.is_match(owner) || !SLUG_COMPONENT.is_match(name) {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for RepoSlug {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RepoSlug> for String {
    fn from(slug: RepoSlug) -> Self {
        slug.to_string()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Upstream branch to sync into a downstream branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMapping {
    /// Branch name in the upstream repository
    pub source: String,
    /// Branch name in the downstream repository
    pub target: String,
    /// Re-apply the overlay branch even if it was applied before
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_overlay: bool,
}

impl BranchMapping {
    /// Mapping without a forced overlay
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            force_overlay: false,
        }
    }
}

impl fmt::Display for BranchMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream/{} -> downstream/{}", self.source, self.target)
    }
}

/// A command run after the upstream merge and before the commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCommitHook {
    /// Display name used in logs and plans
    pub name: String,
    /// Program and arguments
    pub command: Vec<String>,
}

/// How the downstream repository is cloned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    /// `git@github.com:owner/repo.git`
    #[default]
    Ssh,
    /// `https://github.com/owner/repo.git`
    Https,
}

/// Repository metadata from the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    /// Owner/name of the repository
    pub slug: RepoSlug,
    /// Repository name
    pub name: String,
    /// SSH clone URL
    pub ssh_url: String,
    /// HTTPS clone URL
    pub clone_url: String,
    /// Web URL
    pub html_url: String,
}

impl RemoteRepository {
    /// Clone URL for the given protocol
    pub fn url_for(&self, protocol: CloneProtocol) -> &str {
        match protocol {
            CloneProtocol::Ssh => &self.ssh_url,
            CloneProtocol::Https => &self.clone_url,
        }
    }
}

/// An issue on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Web URL for the issue
    pub html_url: String,
}

/// Issue to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    /// Issue title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Logins to assign
    pub assignees: Vec<String>,
}
