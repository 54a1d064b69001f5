//! Manifest construction and rendering.

use super::{
    CONFIG_MAP_KEY, CONFIG_MAP_NAME, CONFIG_MOUNT_PATH, CRON_JOB_NAME, DEFAULT_SCHEDULE,
    SECRET_NAME, SECRET_TOKEN_KEY,
};
use crate::config::{BotConfig, ConfigFile, TOKEN_ENV_VAR};
use crate::error::{Error, Result};
use k8s_openapi::ByteString;
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec,
    Secret, SecretKeySelector, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

const CONFIG_ENV_VAR: &str = "MERGE_BOT_CONFIG";
const CONFIG_VOLUME: &str = "config";

/// Options for manifest rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
    /// Namespace for all objects (omitted when `None`)
    pub namespace: Option<String>,
    /// Container image running the bot
    pub image: String,
    /// Cron schedule
    pub schedule: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            image: "merge-bot:latest".to_string(),
            schedule: DEFAULT_SCHEDULE.to_string(),
        }
    }
}

fn app_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), CRON_JOB_NAME.to_string())])
}

fn object_meta(name: &str, options: &ManifestOptions) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: options.namespace.clone(),
        labels: Some(app_labels()),
        ..Default::default()
    }
}

/// Secret holding the access token
pub fn build_secret(token: &str, options: &ManifestOptions) -> Secret {
    Secret {
        metadata: object_meta(SECRET_NAME, options),
        type_: Some("Opaque".to_string()),
        data: Some(BTreeMap::from([(
            SECRET_TOKEN_KEY.to_string(),
            ByteString(token.as_bytes().to_vec()),
        )])),
        ..Default::default()
    }
}

/// ConfigMap holding the configuration without its token
pub fn build_config_map(config: &BotConfig, options: &ManifestOptions) -> Result<ConfigMap> {
    let text = ConfigFile::from_config(config).to_yaml()?;
    Ok(ConfigMap {
        metadata: object_meta(CONFIG_MAP_NAME, options),
        data: Some(BTreeMap::from([(CONFIG_MAP_KEY.to_string(), text)])),
        ..Default::default()
    })
}

/// CronJob running the bot on `options.schedule`
pub fn build_cron_job(options: &ManifestOptions) -> CronJob {
    let env = vec![
        EnvVar {
            name: CONFIG_ENV_VAR.to_string(),
            value: Some(format!("{CONFIG_MOUNT_PATH}/{CONFIG_MAP_KEY}")),
            ..Default::default()
        },
        EnvVar {
            name: TOKEN_ENV_VAR.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: SECRET_NAME.to_string(),
                    key: SECRET_TOKEN_KEY.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    let container = Container {
        name: CRON_JOB_NAME.to_string(),
        image: Some(options.image.clone()),
        env: Some(env),
        volume_mounts: Some(vec![VolumeMount {
            name: CONFIG_VOLUME.to_string(),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            ..Default::default()
        }]),
        ..Default::default()
    };

    // A failed run waits for the next tick
    let pod_spec = PodSpec {
        containers: vec![container],
        restart_policy: Some("Never".to_string()),
        volumes: Some(vec![Volume {
            name: CONFIG_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: CONFIG_MAP_NAME.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    CronJob {
        metadata: object_meta(CRON_JOB_NAME, options),
        spec: Some(CronJobSpec {
            schedule: options.schedule.clone(),
            concurrency_policy: Some("Forbid".to_string()),
            job_template: JobTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(app_labels()),
                    ..Default::default()
                }),
                spec: Some(JobSpec {
                    template: PodTemplateSpec {
                        metadata: Some(ObjectMeta {
                            labels: Some(app_labels()),
                            ..Default::default()
                        }),
                        spec: Some(pod_spec),
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn validate_schedule(schedule: &str) -> Result<()> {
    let fields = schedule.split_whitespace().count();
    if schedule.trim_start().starts_with('@') || fields == 5 {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "schedule '{schedule}' must have 5 fields (minute hour day month weekday)"
        )))
    }
}

/// Render Secret, ConfigMap and CronJob as one multi-document YAML stream
pub fn render_manifests(config: &BotConfig, options: &ManifestOptions) -> Result<String> {
    validate_schedule(&options.schedule)?;

    let token = config.access_token.as_ref().ok_or_else(|| {
        Error::Config(format!(
            "an access token is required for the Secret; set github_access_token or {TOKEN_ENV_VAR}"
        ))
    })?;

    let documents = [
        serde_yaml::to_string(&build_secret(token.expose(), options))?,
        serde_yaml::to_string(&build_config_map(config, options)?)?,
        serde_yaml::to_string(&build_cron_job(options))?,
    ];

    Ok(documents.join("---\n"))
}
