//! Run command - sync every configured branch

use crate::cli::style::{Stylize, arrow, check, cross};
use anstream::println;
use anyhow::{Context, Result};
use merge_bot::bot::{BranchReport, MergeBot, RunSummary};
use merge_bot::config::BotConfig;
use merge_bot::git::ProcessRunner;
use merge_bot::platform::create_hosting_service;
use merge_bot::sync::SyncOutcome;
use merge_bot::sync::report::IssueFiling;
use std::sync::Arc;

/// Run the bot and print a per-branch summary
pub async fn run(config: &BotConfig) -> Result<()> {
    let hosting = create_hosting_service(config)?;
    let bot = MergeBot::new(config, hosting.as_ref(), Arc::new(ProcessRunner));

    let summary = bot.run().await.context("merge run aborted")?;

    if config.behavior.dry_run {
        print_plans(&summary);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_plans(summary: &RunSummary) {
    println!("{}", "Dry run, no changes made".muted());
    for report in &summary.reports {
        println!();
        println!("{}", report.mapping.to_string().emphasis());
        if report.plan.steps.is_empty() {
            println!("  {}", "nothing to do".muted());
        }
        for step in &report.plan.steps {
            println!("  {} {step}", arrow());
        }
    }
}

fn print_summary(summary: &RunSummary) {
    for report in &summary.reports {
        print_report(report);
    }

    println!();
    let counts = format!(
        "{} pushed, {} up to date, {} failed",
        summary.pushed_count(),
        summary.up_to_date_count(),
        summary.failed_count()
    );
    if summary.is_success() {
        println!("{} {}", check(), counts);
    } else {
        println!("{} {}", cross(), counts.warn());
    }
}

fn print_report(report: &BranchReport) {
    let mapping = report.mapping.to_string();
    match &report.outcome {
        Some(SyncOutcome::Pushed) => println!("{} {} {}", check(), mapping, "pushed".success()),
        Some(SyncOutcome::Committed) => {
            println!("{} {} {}", check(), mapping, "committed (not pushed)".muted());
        }
        Some(SyncOutcome::UpToDate) => {
            println!("{} {} {}", check(), mapping, "up to date".muted());
        }
        Some(SyncOutcome::Failed { step, .. }) => {
            println!("{} {} {} {}", cross(), mapping, "failed at".warn(), step);
            match &report.issue {
                Some(IssueFiling::Created(issue)) => {
                    println!("    {} opened {}", arrow(), issue.html_url.accent());
                }
                Some(IssueFiling::AlreadyOpen(issue)) => {
                    println!("    {} already reported {}", arrow(), issue.html_url.accent());
                }
                None => {}
            }
        }
        None => println!("{} {}", mapping, "skipped".muted()),
    }
}
