use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::ListParams;
use kube::{Api, Client};

use crate::error::ClaimError;

use super::ClaimInfo;

/// Resolves a `namespace/name` claim reference into a `ClaimInfo`,
/// discovering the node a pod already mounting it runs on.
///
/// Fails if the claim doesn't exist or isn't bound. A claim with no
/// mounting pod yet is not an error: `owner_node` is simply `None`,
/// matching the source tool's behavior of deploying unpinned in that
/// case.
pub async fn resolve(
    client: Client,
    context: &str,
    namespace: &str,
    claim_name: &str,
    read_only: bool,
) -> Result<ClaimInfo, ClaimError> {
    let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), namespace);
    let pvc = pvcs
        .get(claim_name)
        .await
        .map_err(|_| ClaimError::NotFound {
            namespace: namespace.to_string(),
            name: claim_name.to_string(),
        })?;

    let phase = pvc
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    if phase != "Bound" {
        return Err(ClaimError::NotBound {
            namespace: namespace.to_string(),
            name: claim_name.to_string(),
            phase,
        });
    }

    let pods: Api<Pod> = Api::namespaced(client, namespace);
    let owner_node = find_owner_node(&pods, claim_name).await;

    Ok(ClaimInfo {
        context: context.to_string(),
        namespace: namespace.to_string(),
        claim_name: claim_name.to_string(),
        owner_node,
        read_only,
    })
}

/// Scans every pod in the namespace and returns the scheduled node of
/// the first one whose volumes reference `claim_name`. First match in
/// list order wins; ties are not otherwise broken.
async fn find_owner_node(pods: &Api<Pod>, claim_name: &str) -> Option<String> {
    let pods = pods.list(&ListParams::default()).await.ok()?;

    for pod in pods.items {
        let mounts_claim = pod
            .spec
            .as_ref()
            .map(|spec| {
                spec.volumes.iter().flatten().any(|v| {
                    v.persistent_volume_claim
                        .as_ref()
                        .map(|pvc| pvc.claim_name == claim_name)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if mounts_claim {
            if let Some(node_name) = pod.spec.as_ref().and_then(|s| s.node_name.clone()) {
                return Some(node_name);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{PersistentVolumeClaimVolumeSource, PodSpec, Volume};

    fn volume_for(claim: &str) -> Volume {
        Volume {
            name: "data".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim.to_string(),
                read_only: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn pod_spec_without_matching_volume_is_not_a_match() {
        let spec = PodSpec {
            volumes: Some(vec![volume_for("other-claim")]),
            node_name: Some("node-a".to_string()),
            ..Default::default()
        };
        let mounts = spec
            .volumes
            .iter()
            .flatten()
            .any(|v| v.persistent_volume_claim.as_ref().map(|p| p.claim_name == "data-claim").unwrap_or(false));
        assert!(!mounts);
    }

    #[test]
    fn pod_spec_with_matching_volume_is_a_match() {
        let spec = PodSpec {
            volumes: Some(vec![volume_for("data-claim")]),
            node_name: Some("node-b".to_string()),
            ..Default::default()
        };
        let mounts = spec
            .volumes
            .iter()
            .flatten()
            .any(|v| v.persistent_volume_claim.as_ref().map(|p| p.claim_name == "data-claim").unwrap_or(false));
        assert!(mounts);
        assert_eq!(spec.node_name.as_deref(), Some("node-b"));
    }
}
