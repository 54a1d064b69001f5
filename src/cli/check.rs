//! Check command - validate and summarize the configuration

use crate::cli::style::{Stylize, arrow, check};
use anstream::println;
use merge_bot::config::BotConfig;
use std::path::Path;

/// Print what the bot would do with this configuration
pub fn print_summary(path: &Path, config: &BotConfig) {
    println!("{} {} is valid", check(), path.display().to_string().emphasis());
    println!();

    println!("  upstream:   {}", config.upstream.to_string().accent());
    println!("  downstream: {}", config.downstream.to_string().accent());
    if let Some(host) = &config.github_host {
        println!("  host:       {host}");
    }
    println!(
        "  token:      {}",
        if config.access_token.is_some() {
            "set".success()
        } else {
            "not set (anonymous)".warn()
        }
    );
    if let Some(overlay) = &config.overlay_branch {
        println!("  overlay:    {overlay}");
    }
    let upstream_name = config.upstream.name.as_str();
    println!(
        "  work dir:   {}",
        config.work_dir_or(upstream_name).display()
    );

    println!();
    println!("{}", "Branches".emphasis());
    for mapping in &config.branches {
        let forced = if mapping.force_overlay {
            " (force overlay)".muted()
        } else {
            String::new()
        };
        println!("  {} {mapping}{forced}", arrow());
    }

    if !config.pre_commit_hooks.is_empty() {
        println!();
        println!("{}", "Pre-commit hooks".emphasis());
        for hook in &config.pre_commit_hooks {
            println!(
                "  {} {}: {}",
                arrow(),
                hook.name,
                hook.command.join(" ").muted()
            );
        }
    }

    if !config.assignees.is_empty() {
        println!();
        println!("  assignees:  {}", config.assignees.join(", "));
    }
}
