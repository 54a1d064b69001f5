//! Manifests command - render Kubernetes deployment objects

use crate::cli::style::{Stylize, check};
use anyhow::{Context, Result};
use merge_bot::config::BotConfig;
use merge_bot::deploy::{ManifestOptions, render_manifests};
use std::path::Path;

/// Render manifests to `output`, or stdout when `None`
pub fn write_manifests(
    config: &BotConfig,
    options: &ManifestOptions,
    output: Option<&Path>,
) -> Result<()> {
    let rendered = render_manifests(config, options)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            anstream::eprintln!(
                "{} Wrote manifests to {}",
                check(),
                path.display().to_string().emphasis()
            );
        }
        None => anstream::print!("{rendered}"),
    }
    Ok(())
}
