//! Best-effort, idempotent teardown of every object one run created.
//!
//! Invoked from the normal-completion path and from the interrupt
//! handler alike, so every deletion here swallows its own error:
//! an object that's already gone is not a failure.

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Secret, Service};
use kube::api::{DeleteParams, ListParams};
use kube::{Api, Client};

use crate::token::InstanceToken;

/// Deletes every object labeled for this instance token, in the order
/// jobs, pods, secrets, services. Logs and continues past any single
/// deletion failure rather than aborting the sweep.
pub async fn run(client: Client, namespace: &str, token: &InstanceToken) {
    let selector = token.selector();

    delete_by_selector::<Job>(client.clone(), namespace, &selector, "job").await;
    delete_by_selector::<Pod>(client.clone(), namespace, &selector, "pod").await;
    delete_by_selector::<Secret>(client.clone(), namespace, &selector, "secret").await;
    delete_by_selector::<Service>(client, namespace, &selector, "service").await;
}

async fn delete_by_selector<K>(client: Client, namespace: &str, selector: &str, kind: &str)
where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    let api: Api<K> = Api::namespaced(client, namespace);
    let list_params = ListParams::default().labels(selector);

    let names = match api.list(&list_params).await {
        Ok(list) => list
            .items
            .into_iter()
            .filter_map(|item| item.meta().name.clone())
            .collect::<Vec<_>>(),
        Err(e) => {
            log::warn!("cleanup: failed to list {kind}s for {selector}: {e}");
            return;
        }
    };

    for name in names {
        if let Err(e) = api.delete(&name, &DeleteParams::default()).await {
            log::warn!("cleanup: failed to delete {kind} {name}: {e}");
        } else {
            log::debug!("cleanup: deleted {kind} {name}");
        }
    }
}
