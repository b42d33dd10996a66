//! Endpoint exposure policy: decides whether the server Service needs
//! to be externally routable, and how to wait for its address.
//!
//! This is a distinct decision from whether the key material secret
//! needs to be replicated to the destination side (`ClaimInfo::is_same_location`,
//! used directly by the orchestrator): exposure only cares about the
//! cluster context, while secret replication also cares about the
//! namespace.

use std::time::Duration;

use k8s_openapi::api::core::v1::Service;
use kube::Api;
use tokio::time::sleep;

use crate::claims::ClaimInfo;

const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Same cluster context and namespace: a ClusterIP is reachable
    /// immediately, address known at creation time.
    IntraCluster,
    /// Different context or namespace: needs a LoadBalancer, whose
    /// ingress address is assigned asynchronously.
    CrossCluster,
}

impl ExposureMode {
    /// Exposure is decided by cluster context alone: a `ClusterIP`
    /// reaches any namespace within the same context, so a namespace
    /// mismatch with a matching context still only needs
    /// `IntraCluster`. Only a differing context needs a routable
    /// `LoadBalancer` address.
    pub fn decide(source: &ClaimInfo, dest: &ClaimInfo) -> Self {
        if source.is_same_context(dest) {
            ExposureMode::IntraCluster
        } else {
            ExposureMode::CrossCluster
        }
    }

    pub fn service_type(self) -> &'static str {
        match self {
            ExposureMode::IntraCluster => "ClusterIP",
            ExposureMode::CrossCluster => "LoadBalancer",
        }
    }
}

/// Resolves the address clients should dial for `service`. For
/// intra-cluster services this is available immediately off the
/// returned object; for cross-cluster services this polls every 10s
/// until an ingress address appears, with no timeout — cluster
/// provisioning of a LoadBalancer is open-ended and the caller is
/// expected to be interruptible via the orchestrator's cancellation.
pub async fn resolve_address(
    services: &Api<Service>,
    name: &str,
    mode: ExposureMode,
) -> Result<String, kube::Error> {
    match mode {
        ExposureMode::IntraCluster => {
            let svc = services.get(name).await?;
            Ok(cluster_ip(&svc).expect("ClusterIP service always has a cluster IP"))
        }
        ExposureMode::CrossCluster => loop {
            let svc = services.get(name).await?;
            if let Some(address) = ingress_address(&svc) {
                return Ok(address);
            }
            sleep(POLL_INTERVAL).await;
        },
    }
}

fn cluster_ip(svc: &Service) -> Option<String> {
    svc.spec.as_ref()?.cluster_ip.clone()
}

fn ingress_address(svc: &Service) -> Option<String> {
    let ingress = svc.status.as_ref()?.load_balancer.as_ref()?.ingress.as_ref()?;
    let first = ingress.first()?;
    first.ip.clone().or_else(|| first.hostname.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(context: &str, namespace: &str) -> ClaimInfo {
        ClaimInfo {
            context: context.to_string(),
            namespace: namespace.to_string(),
            claim_name: "data".to_string(),
            owner_node: None,
            read_only: true,
        }
    }

    #[test]
    fn same_context_and_namespace_is_intra_cluster() {
        let mode = ExposureMode::decide(&claim("c1", "ns1"), &claim("c1", "ns1"));
        assert_eq!(mode, ExposureMode::IntraCluster);
    }

    #[test]
    fn differing_namespace_with_same_context_is_still_intra_cluster() {
        let mode = ExposureMode::decide(&claim("c1", "ns1"), &claim("c1", "ns2"));
        assert_eq!(mode, ExposureMode::IntraCluster);
    }

    #[test]
    fn differing_context_is_cross_cluster() {
        let mode = ExposureMode::decide(&claim("c1", "ns1"), &claim("c2", "ns1"));
        assert_eq!(mode, ExposureMode::CrossCluster);
    }

    #[test]
    fn differing_namespace_with_same_context_still_needs_secret_replication() {
        let source = claim("c1", "ns1");
        let dest = claim("c1", "ns2");
        assert!(!source.is_same_location(&dest));
    }

    #[test]
    fn same_context_and_namespace_does_not_need_secret_replication() {
        let source = claim("c1", "ns1");
        let dest = claim("c1", "ns1");
        assert!(source.is_same_location(&dest));
    }

    #[test]
    fn service_type_matches_mode() {
        assert_eq!(ExposureMode::IntraCluster.service_type(), "ClusterIP");
        assert_eq!(ExposureMode::CrossCluster.service_type(), "LoadBalancer");
    }

    #[test]
    fn ingress_address_prefers_ip_over_hostname() {
        use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, ServiceStatus};

        let svc = Service {
            status: Some(ServiceStatus {
                load_balancer: Some(LoadBalancerStatus {
                    ingress: Some(vec![LoadBalancerIngress {
                        ip: Some("1.2.3.4".to_string()),
                        hostname: Some("lb.example.com".to_string()),
                        ..Default::default()
                    }]),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(ingress_address(&svc), Some("1.2.3.4".to_string()));
    }
}
