//! Command-line front end

mod check;
mod manifests;
mod run;
mod style;

pub use style::Stylize;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use merge_bot::config::{ConfigOverrides, DEFAULT_CONFIG_FILE, LogLevel, load_config};
use merge_bot::deploy::DEFAULT_SCHEDULE;
use merge_bot::types::{BranchMapping, RepoSlug};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Keep a downstream GitHub fork in sync with its upstream branches
#[derive(Debug, Parser)]
#[command(name = "merge-bot", version)]
pub struct Cli {
    /// Path to the bot configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "MERGE_BOT_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Command-line overrides for configuration values
#[derive(Debug, Clone, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct OverrideArgs {
    /// The upstream GitHub repository (owner/repo)
    #[arg(short, long, global = true)]
    pub upstream: Option<RepoSlug>,

    /// The downstream GitHub repository (owner/repo)
    #[arg(short, long, global = true)]
    pub downstream: Option<RepoSlug>,

    /// The upstream branch (replaces the configured branch list)
    #[arg(short = 'U', long, global = true, requires = "downstream_branch")]
    pub upstream_branch: Option<String>,

    /// The downstream branch (replaces the configured branch list)
    #[arg(short = 'D', long, global = true, requires = "upstream_branch")]
    pub downstream_branch: Option<String>,

    /// The downstream branch to overlay on all branches from upstream
    #[arg(short, long, global = true)]
    pub overlay_branch: Option<String>,

    /// Exit on the first error without cleaning the work tree or filing an issue
    #[arg(short, long, global = true)]
    pub exit_on_error: bool,

    /// Do not push after a successful merge
    #[arg(long, global = true)]
    pub no_push: bool,

    /// Do not file a GitHub issue on error
    #[arg(long, global = true)]
    pub no_issue: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        let branch = match (args.upstream_branch, args.downstream_branch) {
            (Some(source), Some(target)) => Some(BranchMapping::new(source, target)),
            _ => None,
        };
        Self {
            upstream: args.upstream,
            downstream: args.downstream,
            overlay_branch: args.overlay_branch,
            branch,
            log_level: args.log_level,
            exit_on_error: args.exit_on_error,
            no_push: args.no_push,
            no_issue: args.no_issue,
        }
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync all configured branches (the default)
    Run {
        /// Print the plan for each branch without merging or pushing.
        ///
        /// The work dir is still cloned (if missing) and `origin` fetched so
        /// target branches can be inspected; the `upstream` remote is left alone.
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration and print a summary
    Check,

    /// Render Kubernetes Secret, ConfigMap and CronJob manifests
    Manifests {
        /// Namespace for all objects
        #[arg(long)]
        namespace: Option<String>,

        /// Container image running the bot
        #[arg(long, default_value = "merge-bot:latest")]
        image: String,

        /// Cron schedule
        #[arg(long, default_value = DEFAULT_SCHEDULE)]
        schedule: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Install the tracing subscriber; `RUST_LOG` wins over `level`
fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the configuration and dispatch the subcommand
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.config, cli.overrides.into())
        .with_context(|| format!("loading {}", cli.config.display()))?;

    init_logging(config.log_level);
    tracing::info!(path = %cli.config.display(), "Loaded config");

    match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => {
            config.behavior.dry_run = dry_run;
            run::run(&config).await
        }
        Commands::Check => {
            check::print_summary(&cli.config, &config);
            Ok(())
        }
        Commands::Manifests {
            namespace,
            image,
            schedule,
            output,
        } => manifests::write_manifests(
            &config,
            &merge_bot::deploy::ManifestOptions {
                namespace,
                image,
                schedule,
            },
            output.as_deref(),
        ),
    }
}
