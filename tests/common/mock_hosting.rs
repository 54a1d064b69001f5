//! Mock hosting service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use merge_bot::error::{Error, Result};
use merge_bot::platform::HostingService;
use merge_bot::types::{Issue, NewIssue, RemoteRepository, RepoSlug};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_issue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueCall {
    pub slug: RepoSlug,
    pub issue: NewIssue,
}

/// Hand-written `HostingService` mock
///
/// Features:
/// - Repositories registered by slug, with URLs derived from the slug
/// - Open issues that `find_open_issue` matches by title
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockHostingService {
    next_issue_number: AtomicU64,
    repositories: Mutex<HashMap<RepoSlug, RemoteRepository>>,
    open_issues: Mutex<Vec<Issue>>,
    // Call tracking
    get_repository_calls: Mutex<Vec<RepoSlug>>,
    find_issue_calls: Mutex<Vec<String>>,
    create_issue_calls: Mutex<Vec<CreateIssueCall>>,
    // Error injection
    error_on_get_repository: Mutex<Option<String>>,
    error_on_find_issue: Mutex<Option<String>>,
    error_on_create_issue: Mutex<Option<String>>,
}

impl Default for MockHostingService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHostingService {
    /// Empty mock; issue numbers start at 1
    pub fn new() -> Self {
        Self {
            next_issue_number: AtomicU64::new(1),
            repositories: Mutex::new(HashMap::new()),
            open_issues: Mutex::new(Vec::new()),
            get_repository_calls: Mutex::new(Vec::new()),
            find_issue_calls: Mutex::new(Vec::new()),
            create_issue_calls: Mutex::new(Vec::new()),
            error_on_get_repository: Mutex::new(None),
            error_on_find_issue: Mutex::new(None),
            error_on_create_issue: Mutex::new(None),
        }
    }

    /// Mock that knows both repositories of a run
    pub fn with_repos(upstream: &str, downstream: &str) -> Self {
        let mock = Self::new();
        mock.add_repository(upstream);
        mock.add_repository(downstream);
        mock
    }

    /// Register a repository with GitHub-style URLs
    pub fn add_repository(&self, slug: &str) {
        let repo = make_repository(slug);
        self.repositories
            .lock()
            .unwrap()
            .insert(repo.slug.clone(), repo);
    }

    /// Register a repository with explicit metadata (e.g. local clone URLs)
    pub fn set_repository(&self, repo: RemoteRepository) {
        self.repositories
            .lock()
            .unwrap()
            .insert(repo.slug.clone(), repo);
    }

    /// Add an issue that `find_open_issue` will return
    pub fn add_open_issue(&self, title: &str) -> Issue {
        let number = self.next_issue_number.fetch_add(1, Ordering::SeqCst);
        let issue = Issue {
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/mock/repo/issues/{number}"),
        };
        self.open_issues.lock().unwrap().push(issue.clone());
        issue
    }

    // === Error injection methods ===

    /// Make `get_repository` return an error
    pub fn fail_get_repository(&self, msg: &str) {
        *self.error_on_get_repository.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `find_open_issue` return an error
    pub fn fail_find_issue(&self, msg: &str) {
        *self.error_on_find_issue.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_issue` return an error
    pub fn fail_create_issue(&self, msg: &str) {
        *self.error_on_create_issue.lock().unwrap() = Some(msg.to_string());
    }

    // === Call inspection ===

    pub fn get_repository_calls(&self) -> Vec<RepoSlug> {
        self.get_repository_calls.lock().unwrap().clone()
    }

    pub fn find_issue_calls(&self) -> Vec<String> {
        self.find_issue_calls.lock().unwrap().clone()
    }

    pub fn create_issue_calls(&self) -> Vec<CreateIssueCall> {
        self.create_issue_calls.lock().unwrap().clone()
    }

    /// Assert exactly `n` issues were created
    pub fn assert_issue_count(&self, n: usize) {
        let calls = self.create_issue_calls();
        assert_eq!(
            calls.len(),
            n,
            "expected {n} created issues, got {}: {calls:?}",
            calls.len()
        );
    }
}

#[async_trait]
impl HostingService for MockHostingService {
    async fn get_repository(&self, slug: &RepoSlug) -> Result<RemoteRepository> {
        self.get_repository_calls.lock().unwrap().push(slug.clone());

        if let Some(msg) = self.error_on_get_repository.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        self.repositories
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("Not Found: {slug}")))
    }

    async fn find_open_issue(&self, _slug: &RepoSlug, title: &str) -> Result<Option<Issue>> {
        self.find_issue_calls.lock().unwrap().push(title.to_string());

        if let Some(msg) = self.error_on_find_issue.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        Ok(self
            .open_issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.title == title)
            .cloned())
    }

    async fn create_issue(&self, slug: &RepoSlug, issue: &NewIssue) -> Result<Issue> {
        self.create_issue_calls.lock().unwrap().push(CreateIssueCall {
            slug: slug.clone(),
            issue: issue.clone(),
        });

        if let Some(msg) = self.error_on_create_issue.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let number = self.next_issue_number.fetch_add(1, Ordering::SeqCst);
        let created = Issue {
            number,
            title: issue.title.clone(),
            html_url: format!("https://github.com/{slug}/issues/{number}"),
        };
        self.open_issues.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

/// Repository metadata as GitHub would report it for `slug`
pub fn make_repository(slug: &str) -> RemoteRepository {
    let slug: RepoSlug = slug.parse().unwrap();
    RemoteRepository {
        name: slug.name.clone(),
        ssh_url: format!("git@github.com:{slug}.git"),
        clone_url: format!("https://github.com/{slug}.git"),
        html_url: format!("https://github.com/{slug}"),
        slug,
    }
}
