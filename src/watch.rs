//! A single readiness-watching capability, parameterized over a
//! label selector and a caller-supplied phase predicate, replacing
//! what the source tool implements as two near-identical watchers
//! (one for pods, one for jobs).

use futures::{StreamExt, TryStreamExt};
use kube::runtime::watcher;
use kube::runtime::WatchStreamExt;
use kube::Api;

use crate::error::MigrationError;

const WATCH_TIMEOUT_SECS: u32 = 5;

/// What a predicate reports about one observed object.
pub enum ReadyState {
    /// Still waiting; keep watching.
    Pending,
    /// Reached the terminal success state.
    Ready,
    /// Reached a terminal failure state; the reason is folded into
    /// `MigrationError::PodTerminal`.
    Failed(String),
}

/// Watches objects of kind `K` matching `selector` until `predicate`
/// reports `Ready` or `Failed`. Used for both "pod is Running" and
/// "job has a Succeeded condition" by passing a different predicate.
pub async fn wait_ready<K, F>(
    api: Api<K>,
    selector: String,
    mut predicate: F,
) -> Result<(), MigrationError>
where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned
        + Send
        + Sync
        + 'static,
    F: FnMut(&K) -> ReadyState,
{
    let config = watcher::Config::default()
        .labels(&selector)
        .timeout(WATCH_TIMEOUT_SECS);

    let mut stream = watcher(api, config).applied_objects().boxed();

    while let Some(obj) = stream
        .try_next()
        .await
        .map_err(|e| MigrationError::Watch(e.to_string()))?
    {
        match predicate(&obj) {
            ReadyState::Ready => return Ok(()),
            ReadyState::Failed(reason) => return Err(MigrationError::PodTerminal(reason)),
            ReadyState::Pending => continue,
        }
    }

    Err(MigrationError::PodTerminal(
        "watch stream ended before the object became ready".to_string(),
    ))
}

/// Pod readiness predicate: `Running` phase is success; `Failed` or
/// `Unknown` is terminal failure (a pod the kubelet has lost track of
/// is never coming back on its own); anything else keeps waiting.
pub fn pod_ready(pod: &k8s_openapi::api::core::v1::Pod) -> ReadyState {
    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("Unknown");

    match phase {
        "Running" => ReadyState::Ready,
        "Failed" | "Unknown" => ReadyState::Failed(
            pod.metadata
                .name
                .clone()
                .unwrap_or_else(|| "<unnamed pod>".to_string()),
        ),
        _ => ReadyState::Pending,
    }
}

/// Job completion predicate: a `Complete` condition with status
/// `"True"` is success, a `Failed` condition with status `"True"` is
/// terminal failure.
pub fn job_ready(job: &k8s_openapi::api::batch::v1::Job) -> ReadyState {
    let conditions = job
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .cloned()
        .unwrap_or_default();

    for condition in &conditions {
        if condition.type_ == "Complete" && condition.status == "True" {
            return ReadyState::Ready;
        }
        if condition.type_ == "Failed" && condition.status == "True" {
            return ReadyState::Failed(
                job.metadata
                    .name
                    .clone()
                    .unwrap_or_else(|| "<unnamed job>".to_string()),
            );
        }
    }

    ReadyState::Pending
}
