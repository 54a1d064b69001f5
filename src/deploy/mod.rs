//! Kubernetes manifests for running the bot as a CronJob
//!
//! Renders a Secret holding the access token, a ConfigMap holding the bot
//! configuration, and a CronJob that mounts the one and injects the other.
//! The objects are `k8s-openapi` types serialized with `serde_yaml`.

mod manifests;

pub use manifests::{
    ManifestOptions, build_config_map, build_cron_job, build_secret, render_manifests,
};

/// Name of the Secret holding the access token
pub const SECRET_NAME: &str = "merge-bot-secrets";

/// Key of the access token inside the Secret
pub const SECRET_TOKEN_KEY: &str = "github-access-token";

/// Name of the ConfigMap holding the bot configuration
pub const CONFIG_MAP_NAME: &str = "merge-bot-config";

/// Key of the configuration text inside the ConfigMap
pub const CONFIG_MAP_KEY: &str = "bot_config.yaml";

/// Name of the CronJob and its container
pub const CRON_JOB_NAME: &str = "merge-bot";

/// Directory the ConfigMap is mounted at
pub const CONFIG_MOUNT_PATH: &str = "/config";

/// Schedule used when none is given
pub const DEFAULT_SCHEDULE: &str = "*/30 * * * *";
