//! Sync planning - pure functions for creating sync plans
//!
//! Apart from [`inspect_branch`], nothing here touches the repository, so
//! plans can be unit tested directly.

use crate::git::Workspace;
use crate::types::{BranchMapping, PreCommitHook};
use std::fmt;

/// Where the downstream target branch currently exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOrigin {
    /// A local branch already exists in the clone
    Local,
    /// Only the downstream remote has it
    Downstream,
    /// Nowhere yet; it will be created from the upstream source branch
    Missing,
}

/// Determine where the target branch of `mapping` exists
pub fn inspect_branch(
    workspace: &Workspace,
    mapping: &BranchMapping,
    downstream_remote: &str,
) -> BranchOrigin {
    if workspace.has_local_branch(&mapping.target) {
        BranchOrigin::Local
    } else if workspace.has_remote_branch(downstream_remote, &mapping.target) {
        BranchOrigin::Downstream
    } else {
        BranchOrigin::Missing
    }
}

/// A single step in the sync plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    /// `git checkout <branch>`
    Checkout {
        /// Local branch name
        branch: String,
    },
    /// `git checkout -b <branch> --track <remote>/<branch>`
    TrackDownstream {
        /// Branch name
        branch: String,
        /// Downstream remote name
        remote: String,
    },
    /// `git checkout <remote>/<source>` then `git checkout -b <branch>`
    CreateFromUpstream {
        /// New local branch name
        branch: String,
        /// Upstream remote name
        remote: String,
        /// Upstream branch to start from
        source: String,
    },
    /// Squash-merge the overlay branch, preferring its side on conflicts
    ApplyOverlay {
        /// Remote holding the overlay branch
        remote: String,
        /// Overlay branch name
        overlay: String,
        /// Apply even if the sentinel file is present
        force: bool,
    },
    /// `git merge <remote>/<source> --no-ff --no-commit`
    MergeUpstream {
        /// Upstream remote name
        remote: String,
        /// Upstream branch name
        source: String,
    },
    /// Run a configured pre-commit hook
    RunHook {
        /// Hook name
        name: String,
        /// Program and arguments
        command: Vec<String>,
    },
    /// `git add --all`
    StageAll,
    /// `git commit -m <message>`
    Commit {
        /// Commit message
        message: String,
    },
    /// `git push <remote> <branch>`
    Push {
        /// Downstream remote name
        remote: String,
        /// Branch to push
        branch: String,
    },
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout { branch } => write!(f, "checkout {branch}"),
            Self::TrackDownstream { branch, remote } => {
                write!(f, "create {branch} tracking {remote}/{branch}")
            }
            Self::CreateFromUpstream {
                branch,
                remote,
                source,
            } => write!(f, "create {branch} from {remote}/{source}"),
            Self::ApplyOverlay {
                remote,
                overlay,
                force,
            } => {
                write!(f, "apply overlay {remote}/{overlay}")?;
                if *force {
                    write!(f, " (forced)")?;
                }
                Ok(())
            }
            Self::MergeUpstream { remote, source } => write!(f, "merge {remote}/{source}"),
            Self::RunHook { name, command } => {
                write!(f, "run hook {name}: {}", command.join(" "))
            }
            Self::StageAll => write!(f, "stage all changes"),
            Self::Commit { message } => write!(f, "commit \"{message}\""),
            Self::Push { remote, branch } => write!(f, "push {branch} to {remote}"),
        }
    }
}

/// Options for sync planning
#[derive(Debug, Clone)]
pub struct SyncPlanOptions {
    /// Remote name of the upstream repository
    pub upstream_remote: String,
    /// Remote name of the downstream repository
    pub downstream_remote: String,
    /// Overlay branch on the downstream remote
    pub overlay_branch: Option<String>,
    /// Hooks to run before committing
    pub hooks: Vec<PreCommitHook>,
    /// Push after committing
    pub push: bool,
}

impl Default for SyncPlanOptions {
    fn default() -> Self {
        Self {
            upstream_remote: "upstream".to_string(),
            downstream_remote: "origin".to_string(),
            overlay_branch: None,
            hooks: Vec::new(),
            push: true,
        }
    }
}

/// Sync plan for one branch mapping
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// The mapping being synced
    pub mapping: BranchMapping,
    /// Ordered steps
    pub steps: Vec<SyncStep>,
}

impl SyncPlan {
    /// Whether the plan ends with a push
    #[must_use]
    pub fn pushes(&self) -> bool {
        matches!(self.steps.last(), Some(SyncStep::Push { .. }))
    }
}

/// Message used for the upstream merge commit
pub fn merge_commit_message(upstream_remote: &str, mapping: &BranchMapping) -> String {
    format!(
        "Merge remote-tracking branch '{upstream_remote}/{}' into {}",
        mapping.source, mapping.target
    )
}

/// Create a sync plan (PURE - no I/O)
#[must_use]
pub fn create_sync_plan(
    mapping: &BranchMapping,
    origin: BranchOrigin,
    options: &SyncPlanOptions,
) -> SyncPlan {
    let mut steps = Vec::with_capacity(options.hooks.len() + 6);
    let branch = mapping.target.clone();

    steps.push(match origin {
        BranchOrigin::Local => SyncStep::Checkout {
            branch: branch.clone(),
        },
        BranchOrigin::Downstream => SyncStep::TrackDownstream {
            branch: branch.clone(),
            remote: options.downstream_remote.clone(),
        },
        BranchOrigin::Missing => SyncStep::CreateFromUpstream {
            branch: branch.clone(),
            remote: options.upstream_remote.clone(),
            source: mapping.source.clone(),
        },
    });

    if let Some(overlay) = &options.overlay_branch {
        steps.push(SyncStep::ApplyOverlay {
            remote: options.downstream_remote.clone(),
            overlay: overlay.clone(),
            force: mapping.force_overlay,
        });
    }

    steps.push(SyncStep::MergeUpstream {
        remote: options.upstream_remote.clone(),
        source: mapping.source.clone(),
    });

    steps.extend(options.hooks.iter().map(|hook| SyncStep::RunHook {
        name: hook.name.clone(),
        command: hook.command.clone(),
    }));

    steps.push(SyncStep::StageAll);
    steps.push(SyncStep::Commit {
        message: merge_commit_message(&options.upstream_remote, mapping),
    });

    if options.push {
        steps.push(SyncStep::Push {
            remote: options.downstream_remote.clone(),
            branch,
        });
    }

    SyncPlan {
        mapping: mapping.clone(),
        steps,
    }
}
