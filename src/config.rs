//! Resolves the CLI's cluster-context parameters into live `kube::Client`s.
//!
//! Grounded on the way `phkaiser13-PeitchGIT`'s `cluster_manager.rs`
//! builds one client per named kubeconfig context: read the
//! kubeconfig once, then derive a `kube::Config` per requested
//! context rather than re-reading the file for each side.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::error::MigrationError;

/// The fully parsed set of parameters a run needs, independent of the
/// `clap` surface that produced them.
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub source_context: Option<String>,
    pub source_namespace: String,
    pub source_claim: String,
    pub dest_context: Option<String>,
    pub dest_namespace: String,
    pub dest_claim: String,
    pub kubeconfig_path: Option<String>,
    pub delete_extraneous: bool,
    pub source_read_only: bool,
}

/// Builds a `kube::Client` for the named context, reading the
/// kubeconfig at `kubeconfig_path` if given, otherwise falling back to
/// `kube::Config`'s own `KUBECONFIG`/`~/.kube/config` resolution.
pub async fn client_for_context(
    kubeconfig_path: Option<&str>,
    context: Option<&str>,
) -> Result<Client, MigrationError> {
    let config = match kubeconfig_path {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .map_err(|e| MigrationError::Config(format!("reading kubeconfig {path}: {e}")))?;
            let options = KubeConfigOptions {
                context: context.map(|c| c.to_string()),
                ..Default::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| MigrationError::Config(format!("resolving context: {e}")))?
        }
        None => {
            let options = KubeConfigOptions {
                context: context.map(|c| c.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options)
                .await
                .map_err(|e| MigrationError::Config(format!("resolving context: {e}")))?
        }
    };

    Client::try_from(config)
        .map_err(|e| MigrationError::Config(format!("building client: {e}")))
}

impl MigrationRequest {
    /// A claim reference is missing when the namespace or claim name
    /// is empty; `clap`'s `required = true` already prevents this for
    /// the CLI surface, but library callers go through this too.
    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.source_namespace.is_empty() || self.source_claim.is_empty() {
            return Err(MigrationError::Config(
                "source namespace and claim name are required".to_string(),
            ));
        }
        if self.dest_namespace.is_empty() || self.dest_claim.is_empty() {
            return Err(MigrationError::Config(
                "destination namespace and claim name are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MigrationRequest {
        MigrationRequest {
            source_context: None,
            source_namespace: "ns-a".to_string(),
            source_claim: "data".to_string(),
            dest_context: None,
            dest_namespace: "ns-b".to_string(),
            dest_claim: "data".to_string(),
            kubeconfig_path: None,
            delete_extraneous: false,
            source_read_only: true,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn empty_source_namespace_is_rejected() {
        let mut req = request();
        req.source_namespace = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_dest_claim_is_rejected() {
        let mut req = request();
        req.dest_claim = String::new();
        assert!(req.validate().is_err());
    }
}
