//! Hosting service access
//!
//! The bot needs three things from GitHub: repository metadata (clone URLs),
//! open issues (to avoid duplicate failure reports) and issue creation.

mod github;

pub use github::GitHubService;

use crate::config::BotConfig;
use crate::error::Result;
use crate::types::{Issue, NewIssue, RemoteRepository, RepoSlug};
use async_trait::async_trait;

/// Hosting service trait for repository and issue operations
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Look up repository metadata
    async fn get_repository(&self, slug: &RepoSlug) -> Result<RemoteRepository>;

    /// Find an open issue whose title matches exactly
    async fn find_open_issue(&self, slug: &RepoSlug, title: &str) -> Result<Option<Issue>>;

    /// Create an issue
    async fn create_issue(&self, slug: &RepoSlug, issue: &NewIssue) -> Result<Issue>;
}

/// Create the hosting service described by the configuration
pub fn create_hosting_service(config: &BotConfig) -> Result<Box<dyn HostingService>> {
    let token = config.access_token.as_ref().map(|t| t.expose());
    let service = GitHubService::new(token, config.github_host.clone())?;
    Ok(Box::new(service))
}
