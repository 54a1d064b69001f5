//! merge-bot: keep a downstream GitHub fork in sync with upstream
//!
//! For each configured branch mapping the bot checks out the downstream
//! branch, optionally applies an overlay branch, merges the upstream branch,
//! runs pre-commit hooks, commits and pushes. Failures are reported as GitHub
//! issues on the downstream repository.

pub mod bot;
pub mod config;
pub mod deploy;
pub mod error;
pub mod git;
pub mod platform;
pub mod sync;
pub mod types;
