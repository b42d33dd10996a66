//! Builds and creates the objects that make up the client side of a
//! migration: the rsync secret and the one-shot rsync Job.

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Secret,
    SecretVolumeSource, Volume, VolumeMount,
};
use kube::api::PostParams;
use kube::{Api, Client};

use crate::keys::KeyBundle;

use super::{object_meta, secret_data};
use super::RSYNC_IMAGE;

const TTL_SECONDS_AFTER_FINISHED: i32 = 600;

/// Creates a secret holding the full key bundle, identical to the
/// source-side secret created by `deploy::server::create_secret` for
/// the same `bundle`/`endpoint_address` pair. Only created when the
/// destination doesn't share the source's namespace and context.
pub async fn create_secret(
    client: Client,
    namespace: &str,
    name: &str,
    labels: BTreeMap<String, String>,
    bundle: &KeyBundle,
    endpoint_address: &str,
) -> Result<Secret, kube::Error> {
    let api: Api<Secret> = Api::namespaced(client, namespace);
    let secret = Secret {
        metadata: object_meta(name, labels),
        data: Some(secret_data(bundle, endpoint_address)),
        ..Default::default()
    };
    api.create(&PostParams::default(), &secret).await
}

/// Builds the rsync command line per the fixed shape: optional
/// `--delete`, then `-avz`, then the remote source, then the local
/// destination. No `-e 'ssh -p ...'` override: the server always
/// listens on the default SSH port.
pub fn rsync_args(endpoint_address: &str, delete: bool) -> Vec<String> {
    let mut args = Vec::new();
    if delete {
        args.push("--delete".to_string());
    }
    args.push("-avz".to_string());
    args.push(format!("root@{}:/source/", endpoint_address));
    args.push("/dest/".to_string());
    args
}

pub async fn create_job(
    client: Client,
    namespace: &str,
    name: &str,
    labels: BTreeMap<String, String>,
    claim_name: &str,
    secret_name: &str,
    endpoint_address: &str,
    delete: bool,
) -> Result<Job, kube::Error> {
    let api: Api<Job> = Api::namespaced(client, namespace);

    let job = Job {
        metadata: object_meta(name, labels.clone()),
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            ttl_seconds_after_finished: Some(TTL_SECONDS_AFTER_FINISHED),
            template: PodTemplateSpec {
                metadata: Some(object_meta(name, labels)),
                spec: Some(PodSpec {
                    restart_policy: Some("Never".to_string()),
                    containers: vec![Container {
                        name: "rsync".to_string(),
                        image: Some(RSYNC_IMAGE.to_string()),
                        image_pull_policy: Some("Always".to_string()),
                        args: Some(rsync_args(endpoint_address, delete)),
                        volume_mounts: Some(vec![
                            VolumeMount {
                                name: "dest-data".to_string(),
                                mount_path: "/dest".to_string(),
                                ..Default::default()
                            },
                            VolumeMount {
                                name: "ssh-keys".to_string(),
                                mount_path: "/etc/ssh/keys".to_string(),
                                read_only: Some(true),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![
                        Volume {
                            name: "dest-data".to_string(),
                            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                                claim_name: claim_name.to_string(),
                                read_only: Some(false),
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: "ssh-keys".to_string(),
                            secret: Some(SecretVolumeSource {
                                secret_name: Some(secret_name.to_string()),
                                default_mode: Some(0o600),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    ]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };

    api.create(&PostParams::default(), &job).await
}
