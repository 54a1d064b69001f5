//! Failure reporting through GitHub issues

use crate::error::Result;
use crate::git::{CommandFailure, Workspace};
use crate::platform::HostingService;
use crate::types::{BranchMapping, Issue, NewIssue, RemoteRepository, RepoSlug};
use chrono::{DateTime, Utc};
use tracing::info;

/// Title of the issue filed when `mapping` fails to sync
pub fn issue_title(mapping: &BranchMapping) -> String {
    format!(
        "Error merging upstream/{} into {}",
        mapping.source, mapping.target
    )
}

/// State of the work tree at the time of a failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// `git status`
    pub status: String,
    /// `ls -lah`
    pub listing: String,
    /// `git diff`
    pub diff: String,
}

impl Diagnostics {
    /// Capture diagnostics; commands that fail are described inline
    pub fn collect(workspace: &Workspace) -> Self {
        Self {
            status: workspace.capture(&["git", "status"]),
            listing: workspace.capture(&["ls", "-lah"]),
            diff: workspace.capture(&["git", "diff"]),
        }
    }
}

/// Everything needed to describe a failed sync
#[derive(Debug, Clone)]
pub struct FailureReport<'a> {
    /// Upstream repository
    pub upstream: &'a RemoteRepository,
    /// Downstream repository
    pub downstream: &'a RemoteRepository,
    /// The mapping that failed
    pub mapping: &'a BranchMapping,
    /// The failing command
    pub failure: &'a CommandFailure,
    /// Work tree state
    pub diagnostics: &'a Diagnostics,
    /// When the failure happened
    pub occurred_at: DateTime<Utc>,
}

/// Render the Markdown issue body
pub fn render_issue_body(report: &FailureReport<'_>) -> String {
    let failure = report.failure;
    let status = failure
        .status
        .map_or_else(|| "none".to_string(), |code| code.to_string());

    format!(
        "## Merge failure\n\
         \n\
         upstream: {upstream}/tree/{source}\n\
         downstream: {downstream}/tree/{target}\n\
         command: `{command}`\n\
         \n\
         status: `{status}`\n\
         \n\
         stdout:\n\
         ```\n\
         {stdout}\n\
         ```\n\
         stderr:\n\
         ```\n\
         {stderr}\n\
         ```\n\
         \n\
         ### Additional debug\n\
         \n\
         ```\n\
         $ git status\n\
         {git_status}\n\
         \n\
         $ ls -lah\n\
         {listing}\n\
         \n\
         $ git diff\n\
         {diff}\n\
         ```\n\
         \n\
         _Reported at {at}_\n",
        upstream = report.upstream.html_url,
        source = report.mapping.source,
        downstream = report.downstream.html_url,
        target = report.mapping.target,
        command = failure.command_line(),
        stdout = failure.stdout.trim(),
        stderr = failure.stderr.trim(),
        git_status = report.diagnostics.status,
        listing = report.diagnostics.listing,
        diff = report.diagnostics.diff,
        at = report.occurred_at.to_rfc3339(),
    )
}

/// What happened when reporting a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueFiling {
    /// A new issue was created
    Created(Issue),
    /// An open issue with the same title already exists
    AlreadyOpen(Issue),
}

impl IssueFiling {
    /// The created or existing issue
    pub const fn issue(&self) -> &Issue {
        match self {
            Self::Created(issue) | Self::AlreadyOpen(issue) => issue,
        }
    }
}

/// File `issue` on `slug` unless an open issue with the same title exists
pub async fn file_failure_issue(
    hosting: &dyn HostingService,
    slug: &RepoSlug,
    issue: &NewIssue,
) -> Result<IssueFiling> {
    if let Some(existing) = hosting.find_open_issue(slug, &issue.title).await? {
        info!(
            "An open issue titled \"{}\" already exists ({}), skipping",
            issue.title, existing.html_url
        );
        return Ok(IssueFiling::AlreadyOpen(existing));
    }

    let created = hosting.create_issue(slug, issue).await?;
    info!(url = %created.html_url, "Created issue \"{}\"", issue.title);
    Ok(IssueFiling::Created(created))
}
