//! Top-level migration state machine.
//!
//! Composes claim resolution, endpoint exposure, key material, the
//! two deploy sequences and the readiness watcher into the ordering
//! spelled out by the design: endpoint before keys, secrets before
//! the pods/jobs that mount them, server-ready before the client job
//! is created. Cleanup runs on every exit path — success, any
//! `MigrationError`, or cancellation — never just on failure.

use crate::cluster_ops::ClusterOps;
use crate::endpoint::ExposureMode;
use crate::error::MigrationError;
use crate::token::InstanceToken;

/// Runs one migration to completion against `ops`, always sweeping
/// cleanup afterward regardless of outcome.
pub async fn migrate<C: ClusterOps>(
    ops: &C,
    token: &InstanceToken,
    delete_extraneous: bool,
) -> Result<(), MigrationError> {
    let result = migrate_inner(ops, token, delete_extraneous).await;
    ops.cleanup(token).await;
    result
}

async fn migrate_inner<C: ClusterOps>(
    ops: &C,
    token: &InstanceToken,
    delete_extraneous: bool,
) -> Result<(), MigrationError> {
    let source_claim = ops.resolve_source_claim().await?;
    let dest_claim = ops.resolve_dest_claim().await?;

    // Two independent decisions: exposure (context only) picks the
    // Service type, while secret replication (namespace or context)
    // decides whether the destination needs its own copy of the bundle.
    let mode = ExposureMode::decide(&source_claim, &dest_claim);
    let endpoint_address = ops.create_endpoint(token, mode).await?;

    let bundle = ops.generate_keys().await?;
    ops.create_server_secret(token, &bundle, &endpoint_address)
        .await?;

    let needs_second_secret = !source_claim.is_same_location(&dest_claim);
    let client_secret_name = if needs_second_secret {
        ops.create_dest_secret(token, &bundle, &endpoint_address)
            .await?;
        token.client_job_name()
    } else {
        token.server_pod_name()
    };

    ops.create_server_pod(token, &source_claim).await?;
    ops.wait_server_ready(token).await?;

    ops.create_client_job(
        token,
        &dest_claim,
        &client_secret_name,
        &endpoint_address,
        delete_extraneous,
    )
    .await?;
    ops.wait_client_done(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimInfo;
    use crate::keys::KeyBundle;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every step invoked, in order, and can be told to fail
    /// at a specific step so tests can assert cleanup still runs.
    struct FakeClusterOps {
        calls: Mutex<Vec<&'static str>>,
        fail_at: Option<&'static str>,
        dest_claim: ClaimInfo,
    }

    impl FakeClusterOps {
        fn new(fail_at: Option<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at,
                dest_claim: claim(),
            }
        }

        fn with_dest_claim(fail_at: Option<&'static str>, dest_claim: ClaimInfo) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at,
                dest_claim,
            }
        }

        fn record(&self, step: &'static str) -> Result<(), MigrationError> {
            self.calls.lock().unwrap().push(step);
            if self.fail_at == Some(step) {
                Err(MigrationError::Config(format!("synthetic failure at {step}")))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn claim() -> ClaimInfo {
        ClaimInfo {
            context: "ctx".to_string(),
            namespace: "ns".to_string(),
            claim_name: "data".to_string(),
            owner_node: None,
            read_only: true,
        }
    }

    fn dest_claim_at(context: &str, namespace: &str) -> ClaimInfo {
        ClaimInfo {
            context: context.to_string(),
            namespace: namespace.to_string(),
            claim_name: "data".to_string(),
            owner_node: None,
            read_only: false,
        }
    }

    #[async_trait]
    impl ClusterOps for FakeClusterOps {
        async fn resolve_source_claim(&self) -> Result<ClaimInfo, MigrationError> {
            self.record("resolve_source_claim")?;
            Ok(claim())
        }

        async fn resolve_dest_claim(&self) -> Result<ClaimInfo, MigrationError> {
            self.record("resolve_dest_claim")?;
            Ok(self.dest_claim.clone())
        }

        async fn generate_keys(&self) -> Result<KeyBundle, MigrationError> {
            self.record("generate_keys")?;
            KeyBundle::generate().map_err(|e| MigrationError::KeyGen(e.to_string()))
        }

        async fn create_endpoint(
            &self,
            _token: &InstanceToken,
            _mode: ExposureMode,
        ) -> Result<String, MigrationError> {
            self.record("create_endpoint")?;
            Ok("10.0.0.5".to_string())
        }

        async fn create_server_secret(
            &self,
            _token: &InstanceToken,
            _bundle: &KeyBundle,
            _endpoint_address: &str,
        ) -> Result<(), MigrationError> {
            self.record("create_server_secret")
        }

        async fn create_dest_secret(
            &self,
            _token: &InstanceToken,
            _bundle: &KeyBundle,
            _endpoint_address: &str,
        ) -> Result<(), MigrationError> {
            self.record("create_dest_secret")
        }

        async fn create_server_pod(
            &self,
            _token: &InstanceToken,
            _claim: &ClaimInfo,
        ) -> Result<(), MigrationError> {
            self.record("create_server_pod")
        }

        async fn wait_server_ready(&self, _token: &InstanceToken) -> Result<(), MigrationError> {
            self.record("wait_server_ready")
        }

        async fn create_client_job(
            &self,
            _token: &InstanceToken,
            _claim: &ClaimInfo,
            _secret_name: &str,
            _endpoint_address: &str,
            _delete_extraneous: bool,
        ) -> Result<(), MigrationError> {
            self.record("create_client_job")
        }

        async fn wait_client_done(&self, _token: &InstanceToken) -> Result<(), MigrationError> {
            self.record("wait_client_done")
        }

        async fn cleanup(&self, _token: &InstanceToken) {
            self.calls.lock().unwrap().push("cleanup");
        }
    }

    fn token() -> InstanceToken {
        InstanceToken::generate()
    }

    #[tokio::test]
    async fn happy_path_runs_every_step_in_order_then_cleans_up() {
        let ops = FakeClusterOps::new(None);
        let result = migrate(&ops, &token(), false).await;
        assert!(result.is_ok());
        assert_eq!(
            ops.calls(),
            vec![
                "resolve_source_claim",
                "resolve_dest_claim",
                "create_endpoint",
                "generate_keys",
                "create_server_secret",
                "create_server_pod",
                "wait_server_ready",
                "create_client_job",
                "wait_client_done",
                "cleanup",
            ]
        );
    }

    #[tokio::test]
    async fn failure_resolving_source_claim_still_cleans_up() {
        let ops = FakeClusterOps::new(Some("resolve_source_claim"));
        let result = migrate(&ops, &token(), false).await;
        assert!(result.is_err());
        assert_eq!(ops.calls(), vec!["resolve_source_claim", "cleanup"]);
    }

    #[tokio::test]
    async fn same_location_claims_skip_creating_a_second_secret() {
        let ops = FakeClusterOps::with_dest_claim(None, dest_claim_at("ctx", "ns"));
        let result = migrate(&ops, &token(), false).await;
        assert!(result.is_ok());
        assert!(!ops.calls().contains(&"create_dest_secret"));
    }

    #[tokio::test]
    async fn differing_namespace_still_creates_a_second_secret() {
        let ops = FakeClusterOps::with_dest_claim(None, dest_claim_at("ctx", "other-ns"));
        let result = migrate(&ops, &token(), false).await;
        assert!(result.is_ok());
        assert!(ops.calls().contains(&"create_dest_secret"));
    }

    #[tokio::test]
    async fn failure_waiting_for_server_still_cleans_up_without_creating_client_job() {
        let ops = FakeClusterOps::new(Some("wait_server_ready"));
        let result = migrate(&ops, &token(), false).await;
        assert!(result.is_err());
        let calls = ops.calls();
        assert!(calls.contains(&"wait_server_ready"));
        assert!(!calls.contains(&"create_client_job"));
        assert_eq!(calls.last(), Some(&"cleanup"));
    }
}
