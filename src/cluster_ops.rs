//! The seam between orchestration logic and the cluster.
//!
//! `ClusterOps` names every cluster-touching step the orchestrator
//! needs, at the granularity the ordering guarantees care about. The
//! real implementation, `KubeClusterOps`, delegates to the `claims`,
//! `keys`, `endpoint`, `deploy` and `watch` modules against two live
//! `kube::Client`s. Tests drive the orchestrator against an in-memory
//! fake instead, so the ordering and cleanup-on-every-path logic in
//! `orchestrator.rs` is exercised without a cluster.

use async_trait::async_trait;
use kube::{Api, Client};

use crate::claims::{self, ClaimInfo};
use crate::config::MigrationRequest;
use crate::deploy;
use crate::endpoint::{self, ExposureMode};
use crate::error::MigrationError;
use crate::keys::KeyBundle;
use crate::token::{Component, InstanceToken};
use crate::watch;

#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn resolve_source_claim(&self) -> Result<ClaimInfo, MigrationError>;
    async fn resolve_dest_claim(&self) -> Result<ClaimInfo, MigrationError>;

    async fn generate_keys(&self) -> Result<KeyBundle, MigrationError>;

    async fn create_endpoint(
        &self,
        token: &InstanceToken,
        mode: ExposureMode,
    ) -> Result<String, MigrationError>;

    async fn create_server_secret(
        &self,
        token: &InstanceToken,
        bundle: &KeyBundle,
        endpoint_address: &str,
    ) -> Result<(), MigrationError>;

    async fn create_dest_secret(
        &self,
        token: &InstanceToken,
        bundle: &KeyBundle,
        endpoint_address: &str,
    ) -> Result<(), MigrationError>;

    async fn create_server_pod(
        &self,
        token: &InstanceToken,
        claim: &ClaimInfo,
    ) -> Result<(), MigrationError>;

    async fn wait_server_ready(&self, token: &InstanceToken) -> Result<(), MigrationError>;

    async fn create_client_job(
        &self,
        token: &InstanceToken,
        claim: &ClaimInfo,
        secret_name: &str,
        endpoint_address: &str,
        delete_extraneous: bool,
    ) -> Result<(), MigrationError>;

    async fn wait_client_done(&self, token: &InstanceToken) -> Result<(), MigrationError>;

    /// Deletes every object this run created on both clusters. Always
    /// safe to call, even if nothing was created yet.
    async fn cleanup(&self, token: &InstanceToken);
}

pub struct KubeClusterOps {
    source_client: Client,
    dest_client: Client,
    request: MigrationRequest,
}

impl KubeClusterOps {
    pub fn new(source_client: Client, dest_client: Client, request: MigrationRequest) -> Self {
        Self {
            source_client,
            dest_client,
            request,
        }
    }
}

#[async_trait]
impl ClusterOps for KubeClusterOps {
    async fn resolve_source_claim(&self) -> Result<ClaimInfo, MigrationError> {
        claims::resolve(
            self.source_client.clone(),
            self.request.source_context.as_deref().unwrap_or("source"),
            &self.request.source_namespace,
            &self.request.source_claim,
            self.request.source_read_only,
        )
        .await
        .map_err(MigrationError::from)
    }

    async fn resolve_dest_claim(&self) -> Result<ClaimInfo, MigrationError> {
        claims::resolve(
            self.dest_client.clone(),
            self.request.dest_context.as_deref().unwrap_or("dest"),
            &self.request.dest_namespace,
            &self.request.dest_claim,
            false,
        )
        .await
        .map_err(MigrationError::from)
    }

    async fn generate_keys(&self) -> Result<KeyBundle, MigrationError> {
        KeyBundle::generate().map_err(|e| MigrationError::KeyGen(e.to_string()))
    }

    async fn create_endpoint(
        &self,
        token: &InstanceToken,
        mode: ExposureMode,
    ) -> Result<String, MigrationError> {
        let labels = token.labels(Component::Sshd);
        let service = deploy::server::create_service(
            self.source_client.clone(),
            &self.request.source_namespace,
            &token.endpoint_name(),
            labels,
            mode,
        )
        .await
        .map_err(|source| MigrationError::Create {
            kind: "Service",
            name: token.endpoint_name(),
            source,
        })?;
        let _ = service;

        let services: Api<k8s_openapi::api::core::v1::Service> =
            Api::namespaced(self.source_client.clone(), &self.request.source_namespace);
        endpoint::resolve_address(&services, &token.endpoint_name(), mode)
            .await
            .map_err(MigrationError::from)
    }

    async fn create_server_secret(
        &self,
        token: &InstanceToken,
        bundle: &KeyBundle,
        endpoint_address: &str,
    ) -> Result<(), MigrationError> {
        deploy::server::create_secret(
            self.source_client.clone(),
            &self.request.source_namespace,
            &token.server_pod_name(),
            token.labels(Component::Sshd),
            bundle,
            endpoint_address,
        )
        .await
        .map(|_| ())
        .map_err(|source| MigrationError::Create {
            kind: "Secret",
            name: token.server_pod_name(),
            source,
        })
    }

    async fn create_dest_secret(
        &self,
        token: &InstanceToken,
        bundle: &KeyBundle,
        endpoint_address: &str,
    ) -> Result<(), MigrationError> {
        deploy::client::create_secret(
            self.dest_client.clone(),
            &self.request.dest_namespace,
            &token.client_job_name(),
            token.labels(Component::Rsync),
            bundle,
            endpoint_address,
        )
        .await
        .map(|_| ())
        .map_err(|source| MigrationError::Create {
            kind: "Secret",
            name: token.client_job_name(),
            source,
        })
    }

    async fn create_server_pod(
        &self,
        token: &InstanceToken,
        claim: &ClaimInfo,
    ) -> Result<(), MigrationError> {
        deploy::server::create_pod(
            self.source_client.clone(),
            &self.request.source_namespace,
            &token.server_pod_name(),
            token.labels(Component::Sshd),
            &claim.claim_name,
            claim.owner_node.as_deref(),
            &token.server_pod_name(),
            claim.read_only,
        )
        .await
        .map(|_| ())
        .map_err(|source| MigrationError::Create {
            kind: "Pod",
            name: token.server_pod_name(),
            source,
        })
    }

    async fn wait_server_ready(&self, token: &InstanceToken) -> Result<(), MigrationError> {
        let pods: Api<k8s_openapi::api::core::v1::Pod> =
            Api::namespaced(self.source_client.clone(), &self.request.source_namespace);
        watch::wait_ready(pods, token.selector(), watch::pod_ready).await
    }

    async fn create_client_job(
        &self,
        token: &InstanceToken,
        claim: &ClaimInfo,
        secret_name: &str,
        endpoint_address: &str,
        delete_extraneous: bool,
    ) -> Result<(), MigrationError> {
        deploy::client::create_job(
            self.dest_client.clone(),
            &self.request.dest_namespace,
            &token.client_job_name(),
            token.labels(Component::Rsync),
            &claim.claim_name,
            secret_name,
            endpoint_address,
            delete_extraneous,
        )
        .await
        .map(|_| ())
        .map_err(|source| MigrationError::Create {
            kind: "Job",
            name: token.client_job_name(),
            source,
        })
    }

    async fn wait_client_done(&self, token: &InstanceToken) -> Result<(), MigrationError> {
        let jobs: Api<k8s_openapi::api::batch::v1::Job> =
            Api::namespaced(self.dest_client.clone(), &self.request.dest_namespace);
        watch::wait_ready(jobs, token.selector(), watch::job_ready).await
    }

    async fn cleanup(&self, token: &InstanceToken) {
        crate::cleanup::run(
            self.source_client.clone(),
            &self.request.source_namespace,
            token,
        )
        .await;
        crate::cleanup::run(
            self.dest_client.clone(),
            &self.request.dest_namespace,
            token,
        )
        .await;
    }
}
