//! Cross-cluster persistent volume migration orchestrator.
//!
//! Stands up a transient SSH server next to a source volume and a
//! transient rsync client job next to a destination volume, wires
//! them together with a freshly minted keypair, and tears every
//! ephemeral object down on every exit path.

pub mod claims;
pub mod cleanup;
pub mod cluster_ops;
pub mod config;
pub mod deploy;
pub mod endpoint;
pub mod error;
pub mod keys;
pub mod logging;
pub mod orchestrator;
pub mod signal;
pub mod token;
pub mod watch;

pub use cluster_ops::{ClusterOps, KubeClusterOps};
pub use config::MigrationRequest;
pub use error::MigrationError;
pub use token::InstanceToken;

use colored::Colorize;

/// Runs one migration end-to-end: resolves both claims, builds
/// `kube::Client`s for each context, and drives the orchestrator
/// through to completion or interruption.
pub async fn run(request: MigrationRequest) -> Result<(), MigrationError> {
    request.validate()?;

    let source_client =
        config::client_for_context(request.kubeconfig_path.as_deref(), request.source_context.as_deref())
            .await?;
    let dest_client =
        config::client_for_context(request.kubeconfig_path.as_deref(), request.dest_context.as_deref())
            .await?;

    let token = InstanceToken::generate();
    logging::print_banner(
        &format!("pv-migrate {}", token.as_str()),
        |s| s.cyan().bold(),
    );

    let ops = KubeClusterOps::new(source_client, dest_client, request.clone());
    let delete_extraneous = request.delete_extraneous;

    let result =
        signal::run_interruptible(&ops, &token, orchestrator::migrate(&ops, &token, delete_extraneous))
            .await;

    match &result {
        Ok(()) => logging::print_banner("migration complete", |s| s.green().bold()),
        Err(e) => {
            log::error!("migration failed: {e}");
            logging::print_banner("migration failed", |s| s.red().bold());
        }
    }

    result
}
