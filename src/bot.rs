//! One bot run over every configured branch mapping

use crate::config::BotConfig;
use crate::error::{Error, Result};
use crate::git::{CommandFailure, CommandRunner, Workspace};
use crate::platform::HostingService;
use crate::sync::report::{
    Diagnostics, FailureReport, IssueFiling, file_failure_issue, issue_title, render_issue_body,
};
use crate::sync::{
    SyncOutcome, SyncPlan, SyncPlanOptions, create_sync_plan, execute_sync, inspect_branch,
};
use crate::types::{BranchMapping, NewIssue, RemoteRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Remote name of the upstream repository in the local clone
pub const UPSTREAM_REMOTE: &str = "upstream";

/// Remote name of the downstream repository (the clone's origin)
pub const DOWNSTREAM_REMOTE: &str = "origin";

/// Result for a single branch mapping
#[derive(Debug, Clone)]
pub struct BranchReport {
    /// The mapping
    pub mapping: BranchMapping,
    /// The plan that was (or, in a dry run, would have been) executed
    pub plan: SyncPlan,
    /// Execution outcome; `None` in a dry run
    pub outcome: Option<SyncOutcome>,
    /// Issue filed for a failure
    pub issue: Option<IssueFiling>,
}

/// Results of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// One report per mapping, in configured order
    pub reports: Vec<BranchReport>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.as_ref().is_some_and(&pred))
            .count()
    }

    /// Mappings that were pushed
    pub fn pushed_count(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Pushed))
    }

    /// Mappings that were already up to date
    pub fn up_to_date_count(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::UpToDate))
    }

    /// Mappings that failed
    pub fn failed_count(&self) -> usize {
        self.count(SyncOutcome::is_failure)
    }

    /// Whether no mapping failed
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// The merge bot
pub struct MergeBot<'a> {
    config: &'a BotConfig,
    hosting: &'a dyn HostingService,
    runner: Arc<dyn CommandRunner>,
}

impl<'a> MergeBot<'a> {
    /// Create a bot for one run
    pub fn new(
        config: &'a BotConfig,
        hosting: &'a dyn HostingService,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            hosting,
            runner,
        }
    }

    /// Sync every configured branch mapping.
    ///
    /// Branch failures are reported and the run continues, unless
    /// `exit_on_error` is set, in which case the failure is returned and the
    /// work tree is left untouched.
    ///
    /// A dry run still clones the work dir and fetches `origin` so the
    /// target branch can be inspected, but never touches the `upstream`
    /// remote.
    pub async fn run(&self) -> Result<RunSummary> {
        let upstream = self.hosting.get_repository(&self.config.upstream).await?;
        let downstream = self.hosting.get_repository(&self.config.downstream).await?;
        let protocol = self.config.clone_protocol;

        let work_dir = self.config.work_dir_or(&upstream.name);
        let workspace = Workspace::clone_or_open(
            Arc::clone(&self.runner),
            downstream.url_for(protocol),
            &work_dir,
        )?;
        workspace.fetch(DOWNSTREAM_REMOTE)?;
        if self.config.behavior.dry_run {
            // Planning only inspects the target branch, which lives on origin
            debug!("dry run, not adding or fetching the {UPSTREAM_REMOTE} remote");
        } else {
            workspace.ensure_remote(UPSTREAM_REMOTE, upstream.url_for(protocol))?;
            workspace.fetch(UPSTREAM_REMOTE)?;
        }

        let options = self.plan_options();
        let mut summary = RunSummary::default();

        for mapping in &self.config.branches {
            let report = self
                .sync_branch(&workspace, mapping, &options, &upstream, &downstream)
                .await?;
            summary.reports.push(report);
        }

        info!(
            pushed = summary.pushed_count(),
            up_to_date = summary.up_to_date_count(),
            failed = summary.failed_count(),
            "run complete"
        );
        Ok(summary)
    }

    fn plan_options(&self) -> SyncPlanOptions {
        SyncPlanOptions {
            upstream_remote: UPSTREAM_REMOTE.to_string(),
            downstream_remote: DOWNSTREAM_REMOTE.to_string(),
            overlay_branch: self.config.overlay_branch.clone(),
            hooks: self.config.pre_commit_hooks.clone(),
            push: !self.config.behavior.no_push,
        }
    }

    async fn sync_branch(
        &self,
        workspace: &Workspace,
        mapping: &BranchMapping,
        options: &SyncPlanOptions,
        upstream: &RemoteRepository,
        downstream: &RemoteRepository,
    ) -> Result<BranchReport> {
        let origin = inspect_branch(workspace, mapping, DOWNSTREAM_REMOTE);
        let plan = create_sync_plan(mapping, origin, options);

        if self.config.behavior.dry_run {
            debug!("Plan for {mapping}:");
            for step in &plan.steps {
                debug!("  {step}");
            }
            return Ok(BranchReport {
                mapping: mapping.clone(),
                plan,
                outcome: None,
                issue: None,
            });
        }

        info!("Syncing {mapping}");
        let outcome = execute_sync(&plan, workspace);
        let mut issue = None;

        match &outcome {
            SyncOutcome::Pushed => info!(
                "Successfully pushed upstream/{} to downstream/{}",
                mapping.source, mapping.target
            ),
            SyncOutcome::Committed => {
                info!("Skipping push to downstream/{}", mapping.target);
            }
            SyncOutcome::UpToDate => {}
            SyncOutcome::Failed { step, failure } => {
                warn!(%step, %failure, "sync of {mapping} failed");

                if self.config.behavior.exit_on_error {
                    return Err(Error::Command(failure.clone()));
                }

                if self.config.behavior.no_issue {
                    info!("Not filing an issue for failure: {failure}");
                } else {
                    issue = self
                        .report_failure(workspace, mapping, failure, upstream, downstream)
                        .await;
                }

                workspace.cleanup();
            }
        }

        Ok(BranchReport {
            mapping: mapping.clone(),
            plan,
            outcome: Some(outcome),
            issue,
        })
    }

    /// File an issue for a failure; errors are logged, not returned
    async fn report_failure(
        &self,
        workspace: &Workspace,
        mapping: &BranchMapping,
        failure: &CommandFailure,
        upstream: &RemoteRepository,
        downstream: &RemoteRepository,
    ) -> Option<IssueFiling> {
        let diagnostics = Diagnostics::collect(workspace);
        let body = render_issue_body(&FailureReport {
            upstream,
            downstream,
            mapping,
            failure,
            diagnostics: &diagnostics,
            occurred_at: Utc::now(),
        });
        let issue = NewIssue {
            title: issue_title(mapping),
            body,
            assignees: self.config.assignees.clone(),
        };

        match file_failure_issue(self.hosting, &downstream.slug, &issue).await {
            Ok(filing) => {
                if let IssueFiling::Created(created) = &filing {
                    info!(
                        "Merging upstream/{} to downstream/{} failed - Created issue {}",
                        mapping.source, mapping.target, created.html_url
                    );
                }
                Some(filing)
            }
            Err(e) => {
                warn!(error = %e, "failed to file issue for {mapping}");
                None
            }
        }
    }
}
