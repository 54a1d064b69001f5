//! GitHub service implementation

use crate::error::{Error, Result};
use crate::platform::HostingService;
use crate::types::{Issue, NewIssue, RemoteRepository, RepoSlug};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::issues::Issue as GitHubIssue;
use tracing::{debug, info};

/// Issues requested per page when scanning open issues
const ISSUES_PER_PAGE: u8 = 100;

fn issue_from_octocrab(issue: &GitHubIssue) -> Issue {
    Issue {
        number: issue.number,
        title: issue.title.clone(),
        html_url: issue.html_url.to_string(),
    }
}

fn repository_from_octocrab(
    slug: &RepoSlug,
    repo: octocrab::models::Repository,
) -> Result<RemoteRepository> {
    let missing = |field: &str| Error::GitHubApi(format!("repository {slug} has no {field}"));

    Ok(RemoteRepository {
        slug: slug.clone(),
        ssh_url: repo.ssh_url.ok_or_else(|| missing("ssh_url"))?,
        clone_url: repo
            .clone_url
            .map(|u| u.to_string())
            .ok_or_else(|| missing("clone_url"))?,
        html_url: repo
            .html_url
            .map(|u| u.to_string())
            .ok_or_else(|| missing("html_url"))?,
        name: repo.name,
    })
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// Without a token the client is anonymous and subject to the
    /// unauthenticated rate limit. `host` selects a GitHub Enterprise server.
    pub fn new(token: Option<&str>, host: Option<String>) -> Result<Self> {
        let base_uri = host.map(|h| format!("https://{h}/api/v3"));
        Self::build(token, base_uri.as_deref())
    }

    /// Create a service talking to an explicit API root (e.g. a local mock)
    pub fn with_base_uri(token: Option<&str>, base_uri: &str) -> Result<Self> {
        Self::build(token, Some(base_uri))
    }

    fn build(token: Option<&str>, base_uri: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder();

        if let Some(token) = token {
            info!("Creating GitHub client with provided access token");
            builder = builder.personal_token(token.to_string());
        } else {
            info!("Creating anonymous GitHub client");
        }

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HostingService for GitHubService {
    async fn get_repository(&self, slug: &RepoSlug) -> Result<RemoteRepository> {
        debug!(%slug, "getting repository");
        let repo = self.client.repos(&slug.owner, &slug.name).get().await?;
        repository_from_octocrab(slug, repo)
    }

    async fn find_open_issue(&self, slug: &RepoSlug, title: &str) -> Result<Option<Issue>> {
        debug!(%slug, title, "searching open issues");
        let mut page = self
            .client
            .issues(&slug.owner, &slug.name)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(ISSUES_PER_PAGE)
            .send()
            .await?;

        loop {
            // The issues endpoint also lists pull requests
            if let Some(found) = page
                .items
                .iter()
                .find(|i| i.pull_request.is_none() && i.title == title)
            {
                debug!(number = found.number, "found open issue");
                return Ok(Some(issue_from_octocrab(found)));
            }

            match self.client.get_page::<GitHubIssue>(&page.next).await? {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!("no matching open issue");
        Ok(None)
    }

    async fn create_issue(&self, slug: &RepoSlug, issue: &NewIssue) -> Result<Issue> {
        debug!(%slug, title = %issue.title, "creating issue");
        let created = self
            .client
            .issues(&slug.owner, &slug.name)
            .create(&issue.title)
            .body(issue.body.as_str())
            .assignees(issue.assignees.clone())
            .send()
            .await?;

        let result = issue_from_octocrab(&created);
        debug!(number = result.number, "created issue");
        Ok(result)
    }
}
