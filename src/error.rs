//! Error types for merge-bot

use crate::git::CommandFailure;
use thiserror::Error;

/// Errors produced by merge-bot
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository slug could not be parsed
    #[error("invalid repository '{0}', expected 'owner/repo' or a GitHub URL")]
    InvalidSlug(String),

    /// GitHub API request failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// A git or hook command exited unsuccessfully
    #[error("{0}")]
    Command(CommandFailure),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse or serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<CommandFailure> for Error {
    fn from(failure: CommandFailure) -> Self {
        Self::Command(failure)
    }
}

/// Result alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
