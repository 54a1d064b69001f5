//! Branch sync engine
//!
//! Three-phase pattern per branch mapping:
//! 1. Gather - inspect where the target branch exists (effectful, cheap)
//! 2. Plan - create `SyncPlan` (pure, testable)
//! 3. Execute - run git and hook commands (effectful)
//!
//! Failures are turned into GitHub issues by [`report`].

mod execute;
mod plan;
pub mod report;

pub use execute::{SyncOutcome, execute_sync, overlay_sentinel};
pub use plan::{
    BranchOrigin, SyncPlan, SyncPlanOptions, SyncStep, create_sync_plan, inspect_branch,
    merge_commit_message,
};
