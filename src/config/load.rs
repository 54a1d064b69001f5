//! Reading the configuration file from disk.

use super::{BotConfig, ConfigFile, ConfigOverrides, resolve};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Config path used when neither `--config` nor `MERGE_BOT_CONFIG` is set.
pub const DEFAULT_CONFIG_FILE: &str = "bot_config.yaml";

/// Environment variable consulted when the file has no token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_ACCESS_TOKEN";

/// Read and parse a configuration file without validating it.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    debug!(path = %path.display(), "reading config file");

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    // An empty file parses as YAML null
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Load, layer and validate the configuration.
///
/// Reads `path`, applies `overrides`, and falls back to the
/// `GITHUB_ACCESS_TOKEN` environment variable for the token.
pub fn load_config(path: &Path, overrides: ConfigOverrides) -> Result<BotConfig> {
    let file = load_config_file(path)?;
    resolve(file, overrides, path, std::env::var(TOKEN_ENV_VAR).ok())
}
