//! Builds and creates the objects that make up the server side of a
//! migration: the Service, the sshd secret(s), and the sshd Pod
//! itself, pinned to the node that already mounts the source volume
//! when one is known.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, EnvVar, PersistentVolumeClaimVolumeSource, Pod, PodSpec, Secret, SecretVolumeSource,
    Service, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::PostParams;
use kube::{Api, Client};

use crate::endpoint::ExposureMode;
use crate::keys::KeyBundle;

use super::{object_meta, secret_data};
use super::{SSHD_IMAGE, SSH_PORT};

pub async fn create_service(
    client: Client,
    namespace: &str,
    name: &str,
    labels: BTreeMap<String, String>,
    mode: ExposureMode,
) -> Result<Service, kube::Error> {
    let api: Api<Service> = Api::namespaced(client, namespace);
    let service = Service {
        metadata: object_meta(name, labels.clone()),
        spec: Some(ServiceSpec {
            type_: Some(mode.service_type().to_string()),
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                port: SSH_PORT,
                target_port: Some(IntOrString::Int(SSH_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };
    api.create(&PostParams::default(), &service).await
}

/// Creates a secret holding the full key bundle (`host-key`,
/// `host-pub`, `user-key`, `user-pub`). Called with the same `bundle`
/// and `endpoint_address` as the destination-side secret (when one is
/// created), so the two secrets hold identical data.
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

/// Creates the sshd pod. `node_name` pins it next to the source volume
/// when the claim resolver found an owning pod; otherwise the
/// scheduler picks, same as the source tool falls back to when no
/// owner node is known. `source_read_only` mirrors the resolved
/// claim's read-only setting onto both the volume mount and the
/// volume source.
pub async fn create_pod(
    client: Client,
    namespace: &str,
    name: &str,
    labels: BTreeMap<String, String>,
    claim_name: &str,
    node_name: Option<&str>,
    secret_name: &str,
    source_read_only: bool,
) -> Result<Pod, kube::Error> {
    let api: Api<Pod> = Api::namespaced(client, namespace);

    let pod = Pod {
        metadata: object_meta(name, labels),
        spec: Some(PodSpec {
            node_name: node_name.map(|s| s.to_string()),
            restart_policy: Some("Never".to_string()),
            containers: vec![Container {
                name: "sshd".to_string(),
                image: Some(SSHD_IMAGE.to_string()),
                image_pull_policy: Some("Always".to_string()),
                env: Some(vec![EnvVar {
                    name: "SSH_PORT".to_string(),
                    value: Some(SSH_PORT.to_string()),
                    ..Default::default()
                }]),
                volume_mounts: Some(vec![
                    VolumeMount {
                        name: "source-data".to_string(),
                        mount_path: "/source".to_string(),
                        read_only: Some(source_read_only),
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
                    name: "source-data".to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: claim_name.to_string(),
                        read_only: Some(source_read_only),
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
        ..Default::default()
    };

    api.create(&PostParams::default(), &pod).await
}
