//! Sync execution - effectful operations
//!
//! Takes a `SyncPlan` (created by the pure planning functions) and runs it
//! against the local clone, stopping at the first failing command.

use crate::git::{CommandFailure, Workspace};
use crate::sync::plan::{SyncPlan, SyncStep};
use tracing::{debug, info};

/// Git reports this when a commit has no changes
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// Result of executing a sync plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Merge committed and pushed
    Pushed,
    /// Merge committed, push disabled
    Committed,
    /// Upstream had nothing new for this branch
    UpToDate,
    /// A command failed; later steps were not run
    Failed {
        /// The step that failed
        step: SyncStep,
        /// The failing command
        failure: CommandFailure,
    },
}

impl SyncOutcome {
    /// Whether the plan stopped on a failure
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The failing command, if any
    pub const fn failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Name of the file recording that `overlay` was applied to a branch
pub fn overlay_sentinel(overlay: &str) -> String {
    format!(".{overlay}_merged")
}

enum Flow {
    Continue,
    UpToDate,
}

/// A file operation failure, reported like a failed command
fn write_failure(path: &str, err: &std::io::Error) -> CommandFailure {
    CommandFailure {
        command: vec!["write".to_string(), path.to_string()],
        status: None,
        stdout: String::new(),
        stderr: err.to_string(),
    }
}

#[derive(Default)]
struct ExecutionState {
    overlay_committed: bool,
    pushed: bool,
}

/// Execute the sync plan (EFFECTFUL)
///
/// Every failure, including writing the sentinel file, is reported as
/// [`SyncOutcome::Failed`] naming the step that stopped the plan.
pub fn execute_sync(plan: &SyncPlan, workspace: &Workspace) -> SyncOutcome {
    let mut state = ExecutionState::default();

    for step in &plan.steps {
        debug!(branch = %plan.mapping.target, %step, "executing step");

        match run_step(step, workspace, &mut state) {
            Ok(Flow::Continue) => {}
            Ok(Flow::UpToDate) => {
                info!(
                    "Nothing to do, upstream/{} has no changes not present in downstream/{}",
                    plan.mapping.source, plan.mapping.target
                );
                return SyncOutcome::UpToDate;
            }
            Err(failure) => {
                return SyncOutcome::Failed {
                    step: step.clone(),
                    failure,
                };
            }
        }
    }

    if state.pushed {
        SyncOutcome::Pushed
    } else {
        SyncOutcome::Committed
    }
}

fn run_step(
    step: &SyncStep,
    ws: &Workspace,
    state: &mut ExecutionState,
) -> Result<Flow, CommandFailure> {
    match step {
        SyncStep::Checkout { branch } => {
            ws.git(&["checkout", branch.as_str()])?;
        }
        SyncStep::TrackDownstream { branch, remote } => {
            let start = format!("{remote}/{branch}");
            ws.git(&["checkout", "-b", branch.as_str(), "--track", start.as_str()])?;
        }
        SyncStep::CreateFromUpstream {
            branch,
            remote,
            source,
        } => {
            let start = format!("{remote}/{source}");
            ws.git(&["checkout", start.as_str()])?;
            ws.git(&["checkout", "-b", branch.as_str()])?;
        }
        SyncStep::ApplyOverlay {
            remote,
            overlay,
            force,
        } => apply_overlay(ws, remote, overlay, *force, state)?,
        SyncStep::MergeUpstream { remote, source } => {
            let upstream = format!("{remote}/{source}");
            ws.git(&["merge", upstream.as_str(), "--no-ff", "--no-commit"])?;
        }
        SyncStep::RunHook { name, command } => {
            info!(hook = %name, "running pre-commit hook");
            ws.exec(command)?;
        }
        SyncStep::StageAll => {
            ws.git(&["add", "--all"])?;
        }
        SyncStep::Commit { message } => match ws.git(&["commit", "-m", message.as_str()]) {
            Ok(_) => info!("{message}"),
            Err(failure) if failure.mentions(NOTHING_TO_COMMIT) => {
                if !state.overlay_committed {
                    return Ok(Flow::UpToDate);
                }
                debug!("no upstream changes, but the overlay commit still needs pushing");
            }
            Err(failure) => return Err(failure),
        },
        SyncStep::Push { remote, branch } => {
            ws.git(&["push", remote.as_str(), branch.as_str()])?;
            state.pushed = true;
            info!("Pushed {branch} to {remote}");
        }
    }
    Ok(Flow::Continue)
}

fn apply_overlay(
    ws: &Workspace,
    remote: &str,
    overlay: &str,
    force: bool,
    state: &mut ExecutionState,
) -> Result<(), CommandFailure> {
    let sentinel = overlay_sentinel(overlay);
    if !force && ws.file_exists(&sentinel) {
        debug!(%sentinel, "overlay already applied");
        return Ok(());
    }

    let overlay_ref = format!("{remote}/{overlay}");
    ws.git(&[
        "merge",
        overlay_ref.as_str(),
        "--allow-unrelated-histories",
        "--squash",
        "--strategy",
        "recursive",
        "-X",
        "theirs",
    ])?;
    ws.write_file(&sentinel, "True").map_err(|e| write_failure(&sentinel, &e))?;
    ws.git(&["add", "--all"])?;

    if ws.is_clean()? {
        debug!("overlay produced no changes");
        return Ok(());
    }

    let message = format!("Merged {remote}/{overlay} and added sentinel");
    ws.git(&["commit", "-m", message.as_str()])?;
    state.overlay_committed = true;
    info!("{message}");
    Ok(())
}
