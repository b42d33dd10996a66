//! Error kinds for the migration orchestrator.
//!
//! Mirrors the policy table in the design doc: each kind maps to an exit
//! behavior (cleanup or not) that `main` inspects after the orchestrator
//! returns.

use thiserror::Error;

/// All fatal error kinds the orchestrator can surface.
///
/// `main` matches on this to decide whether cleanup already ran and what
/// exit code to use; everything that reaches this type is fatal by
/// definition — recoverable conditions are handled inline and never
/// constructed as one of these variants.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Invalid or missing CLI parameters, or an unresolvable cluster context.
    /// Nothing was created yet, so no cleanup is needed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The claim does not exist, or exists but isn't bound.
    #[error("claim error: {0}")]
    Claim(#[from] ClaimError),

    /// Key bundle generation failed.
    #[error("key generation failed: {0}")]
    KeyGen(String),

    /// An endpoint, secret, pod, or job was rejected by the cluster.
    #[error("failed to create {kind} '{name}': {source}")]
    Create {
        kind: &'static str,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// A watched pod reached a terminal failure state.
    #[error("{0} reached a terminal failed state")]
    PodTerminal(String),

    /// The watch stream itself failed (connection drop, decode error, etc).
    #[error("watch stream error: {0}")]
    Watch(String),

    /// SIGINT/SIGTERM was received mid-run.
    #[error("interrupted")]
    Interruption,

    /// Catch-all for cluster API errors that don't fit a more specific kind.
    #[error("cluster API error: {0}")]
    Cluster(#[from] kube::Error),
}

/// Errors specific to resolving a claim to a `ClaimInfo`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("persistent volume claim '{namespace}/{name}' not found")]
    NotFound { namespace: String, name: String },

    #[error("persistent volume claim '{namespace}/{name}' is not bound (phase: {phase})")]
    NotBound {
        namespace: String,
        name: String,
        phase: String,
    },
}
